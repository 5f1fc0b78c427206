//! Command-line tool resource backed by winget.
use anyhow::Result;
use std::fmt;

use super::{Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;
use crate::exec::{Executor, RetryPolicy};
use crate::logging::Log;

/// A tool that must be installed through the package manager.
pub struct ToolResource<'a> {
    /// Package-manager id (e.g. `Git.Git`).
    pub id: String,
    /// Optional executable name probed on `PATH` before asking winget.
    pub command: Option<String>,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    retry: RetryPolicy,
}

impl<'a> ToolResource<'a> {
    /// Create a new tool resource. Retried installs are reported to `log`.
    #[must_use]
    pub const fn new(
        id: String,
        command: Option<String>,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            command,
            executor,
            log,
            retry,
        }
    }
}

impl fmt::Debug for ToolResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolResource")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Resource for ToolResource<'_> {
    fn description(&self) -> String {
        self.command
            .as_ref()
            .map_or_else(|| self.id.clone(), |cmd| format!("{} ({cmd})", self.id))
    }

    fn current_state(&self) -> Result<ResourceState> {
        if let Some(cmd) = &self.command
            && self.executor.which(cmd)
        {
            return Ok(ResourceState::Correct);
        }
        let result = self.executor.run_unchecked(
            "winget",
            &[
                "list",
                "--id",
                &self.id,
                "--exact",
                "--accept-source-agreements",
                "--disable-interactivity",
            ],
        )?;
        if result.success && result.stdout.contains(self.id.as_str()) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.retry
            .run(
                || {
                    self.executor.run(
                        "winget",
                        &[
                            "install",
                            "--id",
                            &self.id,
                            "--exact",
                            "--silent",
                            "--accept-package-agreements",
                            "--accept-source-agreements",
                        ],
                    )
                },
                |attempt, e| {
                    self.log.warn(&format!(
                        "winget install {} failed ({e:#}), attempt {attempt}/{}",
                        self.id, self.retry.attempts
                    ));
                },
            )
            .map_err(|e| ResourceError::InstallFailed {
                name: self.id.clone(),
                reason: format!("{e:#}"),
            })?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::RecordingLog;

    fn tool<'a>(
        executor: &'a MockExecutor,
        log: &'a RecordingLog,
        command: Option<&str>,
    ) -> ToolResource<'a> {
        ToolResource::new(
            "Git.Git".to_string(),
            command.map(String::from),
            executor,
            log,
            RetryPolicy::new(3, std::time::Duration::ZERO),
        )
    }

    #[test]
    fn description_includes_command() {
        let executor = MockExecutor::ok("");
        let log = RecordingLog::default();
        assert_eq!(tool(&executor, &log, Some("git")).description(), "Git.Git (git)");
        assert_eq!(tool(&executor, &log, None).description(), "Git.Git");
    }

    #[test]
    fn command_on_path_is_correct_without_winget() {
        let executor = MockExecutor::with_responses(vec![]).with_which(true);
        let log = RecordingLog::default();
        let state = tool(&executor, &log, Some("git")).current_state().unwrap();
        assert_eq!(state, ResourceState::Correct);
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn winget_list_containing_id_is_correct() {
        let executor = MockExecutor::ok("Name  Id       Version\nGit   Git.Git  2.45.0\n");
        let log = RecordingLog::default();
        let state = tool(&executor, &log, Some("git")).current_state().unwrap();
        assert_eq!(state, ResourceState::Correct);
        assert!(executor.calls()[0].starts_with("winget list --id Git.Git --exact"));
    }

    #[test]
    fn winget_list_without_id_is_missing() {
        let executor = MockExecutor::ok("No installed package found matching input criteria.");
        let log = RecordingLog::default();
        let state = tool(&executor, &log, None).current_state().unwrap();
        assert_eq!(state, ResourceState::Missing);
    }

    #[test]
    fn failed_winget_list_is_missing() {
        let executor = MockExecutor::fail();
        let log = RecordingLog::default();
        let state = tool(&executor, &log, None).current_state().unwrap();
        assert_eq!(state, ResourceState::Missing);
    }

    #[test]
    fn install_retries_then_succeeds() {
        let executor = MockExecutor::with_responses(vec![
            (false, String::new()),
            (true, "Successfully installed".to_string()),
        ]);
        let log = RecordingLog::default();
        let change = tool(&executor, &log, None).apply().unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(executor.call_count(), 2);
        assert!(executor.calls()[1].contains("--silent"));
        assert!(log.contains("[warn] winget install Git.Git failed"));
        assert!(log.contains("attempt 2/3"));
    }

    #[test]
    fn install_gives_up_after_budget() {
        let executor = MockExecutor::with_responses(vec![]);
        let log = RecordingLog::default();
        let err = tool(&executor, &log, None).apply().unwrap_err();
        assert_eq!(executor.call_count(), 3);
        let typed = err.downcast_ref::<ResourceError>().unwrap();
        assert!(matches!(typed, ResourceError::InstallFailed { name, .. } if name == "Git.Git"));
    }
}

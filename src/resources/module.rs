//! PowerShell module resource.
use anyhow::Result;
use std::fmt;

use super::{Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;
use crate::exec::{Executor, RetryPolicy};
use crate::logging::Log;

/// Shell used to query and install modules.
pub const POWERSHELL: &str = "pwsh";

/// A PowerShell module installed for the current user.
pub struct ModuleResource<'a> {
    /// Module name as published in the PowerShell Gallery.
    pub name: String,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    retry: RetryPolicy,
}

impl<'a> ModuleResource<'a> {
    /// Create a new module resource.
    #[must_use]
    pub const fn new(
        name: String,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            name,
            executor,
            log,
            retry,
        }
    }

    fn powershell(&self, script: &str) -> Result<crate::exec::ExecResult> {
        self.executor
            .run(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", script])
    }
}

impl fmt::Debug for ModuleResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleResource")
            .field("name", &self.name)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Resource for ModuleResource<'_> {
    fn description(&self) -> String {
        format!("module {}", self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let script = format!("Get-Module -ListAvailable -Name '{}'", self.name);
        let result = self.executor.run_unchecked(
            POWERSHELL,
            &["-NoProfile", "-NonInteractive", "-Command", &script],
        )?;
        if result.success && !result.stdout.trim().is_empty() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        let script = format!(
            "Install-Module -Name '{}' -Scope CurrentUser -Force -AllowClobber",
            self.name
        );
        self.retry
            .run(
                || self.powershell(&script),
                |attempt, e| {
                    self.log.warn(&format!(
                        "Install-Module {} failed ({e:#}), attempt {attempt}/{}",
                        self.name, self.retry.attempts
                    ));
                },
            )
            .map_err(|e| ResourceError::InstallFailed {
                name: self.name.clone(),
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

    fn module<'a>(executor: &'a MockExecutor, log: &'a RecordingLog) -> ModuleResource<'a> {
        ModuleResource::new(
            "Terminal-Icons".to_string(),
            executor,
            log,
            RetryPolicy::new(2, std::time::Duration::ZERO),
        )
    }

    #[test]
    fn listed_module_is_correct() {
        let executor = MockExecutor::ok("Script 0.11.0 Terminal-Icons");
        let log = RecordingLog::default();
        assert_eq!(
            module(&executor, &log).current_state().unwrap(),
            ResourceState::Correct
        );
        assert!(executor.calls()[0].contains("Get-Module -ListAvailable -Name 'Terminal-Icons'"));
    }

    #[test]
    fn empty_listing_is_missing() {
        let executor = MockExecutor::ok("  \n");
        let log = RecordingLog::default();
        assert_eq!(
            module(&executor, &log).current_state().unwrap(),
            ResourceState::Missing
        );
    }

    #[test]
    fn install_uses_current_user_scope() {
        let executor = MockExecutor::ok("");
        let log = RecordingLog::default();
        assert_eq!(module(&executor, &log).apply().unwrap(), ResourceChange::Applied);
        assert!(executor.calls()[0].contains("-Scope CurrentUser -Force -AllowClobber"));
    }

    #[test]
    fn install_failure_is_typed() {
        let executor = MockExecutor::with_responses(vec![]);
        let log = RecordingLog::default();
        let err = module(&executor, &log).apply().unwrap_err();
        assert_eq!(executor.call_count(), 2);
        assert!(err.downcast_ref::<ResourceError>().is_some());
        assert!(log.contains("[warn] Install-Module Terminal-Icons failed"));
        assert!(log.contains("attempt 2/2"));
    }
}

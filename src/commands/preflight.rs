//! Checks that must pass before the run changes anything.
use crate::config::Config;
use crate::error::PreconditionError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// Fail if any `required` link has no source in the repository.
///
/// # Errors
///
/// Returns [`PreconditionError::MissingRequiredSource`] for the first
/// missing source; every missing source is logged.
pub fn check_required_sources(config: &Config, log: &dyn Log) -> Result<(), PreconditionError> {
    let missing = config.missing_required_sources();
    for link in &missing {
        log.error(&format!(
            "required source missing for {}: {}",
            link.label,
            link.source.display()
        ));
    }
    missing.first().map_or(Ok(()), |link| {
        Err(PreconditionError::MissingRequiredSource {
            label: link.label.clone(),
            path: link.source.clone(),
        })
    })
}

/// Fail unless symlinks can be created: the process is elevated, or
/// Developer Mode is on.
///
/// `developer_mode` is only consulted when the process is not elevated.
///
/// # Errors
///
/// Returns [`PreconditionError::NotElevated`] if neither holds.
pub fn check_privileges(
    platform: &Platform,
    executor: &dyn Executor,
    developer_mode: impl FnOnce() -> bool,
    log: &dyn Log,
) -> Result<(), PreconditionError> {
    if platform.is_elevated(executor) {
        log.debug("running elevated");
        return Ok(());
    }
    if developer_mode() {
        log.debug("not elevated, but Developer Mode is enabled");
        return Ok(());
    }
    Err(PreconditionError::NotElevated)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::LinkSpec;
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{RecordingLog, empty_config};
    use std::path::Path;

    fn link(dir: &Path, name: &str, required: bool) -> LinkSpec {
        LinkSpec {
            source: dir.join(name),
            target: dir.join(format!("{name}.target")),
            label: name.to_string(),
            required,
        }
    }

    #[test]
    fn optional_missing_source_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = empty_config(dir.path());
        config.links = vec![link(dir.path(), "theme.omp.json", false)];
        let log = RecordingLog::default();
        assert!(check_required_sources(&config, &log).is_ok());
    }

    #[test]
    fn required_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present"), "x").unwrap();
        let mut config = empty_config(dir.path());
        config.links = vec![
            link(dir.path(), "present", true),
            link(dir.path(), "profile.ps1", true),
        ];
        let log = RecordingLog::default();
        let err = check_required_sources(&config, &log).unwrap_err();
        assert!(matches!(
            err,
            PreconditionError::MissingRequiredSource { ref label, .. } if label == "profile.ps1"
        ));
        assert!(log.contains("[error] required source missing for profile.ps1"));
        assert!(!log.contains("for present"));
    }

    #[test]
    fn elevated_windows_passes_without_developer_mode() {
        let executor = MockExecutor::with_responses(vec![(true, String::new())]);
        let log = RecordingLog::default();
        let result = check_privileges(
            &Platform::new(Os::Windows),
            &executor,
            || panic!("developer mode should not be consulted"),
            &log,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn developer_mode_substitutes_for_elevation() {
        let executor = MockExecutor::with_responses(vec![(false, String::new())]);
        let log = RecordingLog::default();
        assert!(check_privileges(&Platform::new(Os::Windows), &executor, || true, &log).is_ok());
        assert!(log.contains("Developer Mode is enabled"));
    }

    #[test]
    fn unprivileged_windows_fails() {
        let executor = MockExecutor::with_responses(vec![(false, String::new())]);
        let log = RecordingLog::default();
        assert!(matches!(
            check_privileges(&Platform::new(Os::Windows), &executor, || false, &log),
            Err(PreconditionError::NotElevated)
        ));
    }

    #[test]
    fn other_platforms_need_no_elevation() {
        let executor = MockExecutor::with_responses(vec![]);
        let log = RecordingLog::default();
        assert!(check_privileges(&Platform::new(Os::Linux), &executor, || false, &log).is_ok());
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::exec::{Executor, RetryPolicy};
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for task execution.
///
/// Everything a task needs is passed in here; tasks never read or change
/// process-wide state such as the working directory or environment.
pub struct Context {
    /// Resolved manifest.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("executor", &"<dyn Executor>")
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        home: PathBuf,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            config,
            platform,
            log,
            dry_run,
            home,
            executor,
        }
    }

    /// Root directory of the dotfiles repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Retry policy for transient external steps.
    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.config.retry_policy()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::context_with;

    #[test]
    fn root_returns_config_root() {
        let (ctx, _log) = context_with(Vec::new());
        assert_eq!(ctx.root(), ctx.config.root.as_path());
    }

    #[test]
    fn retry_follows_settings() {
        let (ctx, _log) = context_with(Vec::new());
        assert_eq!(ctx.retry().attempts, ctx.config.settings.retries);
    }

    #[test]
    fn debug_hides_trait_objects() {
        let (ctx, _log) = context_with(Vec::new());
        let dbg = format!("{ctx:?}");
        assert!(dbg.contains("<dyn Log>"));
        assert!(dbg.contains("dry_run: false"));
    }
}

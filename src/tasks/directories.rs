//! Task: create directories.
use anyhow::Result;

use super::{Component, Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::directory::DirectoryResource;

/// Create directories listed in the manifest.
#[derive(Debug)]
pub struct CreateDirectories;

impl Task for CreateDirectories {
    fn name(&self) -> &'static str {
        "Create directories"
    }

    fn component(&self) -> Component {
        Component::Directories
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.directories.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources = ctx
            .config
            .directories
            .iter()
            .cloned()
            .map(DirectoryResource::new);
        Ok(process_resources(
            ctx,
            resources,
            &ProcessOpts::apply_all("create"),
        ))
    }
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
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    #[test]
    fn creates_missing_and_skips_blocked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("exists")).unwrap();
        std::fs::write(dir.path().join("blocked"), "file").unwrap();
        let mut config = empty_config(dir.path());
        config.directories = vec![
            dir.path().join("exists"),
            dir.path().join("new/nested"),
            dir.path().join("blocked"),
        ];
        let (ctx, log) = make_context(
            config,
            Os::Linux,
            Arc::new(MockExecutor::with_responses(vec![])),
        );

        let TaskResult::Done(stats) = CreateDirectories.run(&ctx).unwrap() else {
            panic!("expected counters");
        };
        assert_eq!(stats.already_ok, 1);
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.skipped, 1);
        assert!(dir.path().join("new/nested").is_dir());
        assert!(log.contains("not a directory"));
    }

    #[test]
    fn dry_run_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = empty_config(dir.path());
        config.directories = vec![dir.path().join("later")];
        let (mut ctx, log) = make_context(
            config,
            Os::Linux,
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        ctx.dry_run = true;

        CreateDirectories.run(&ctx).unwrap();
        assert!(!dir.path().join("later").exists());
        assert!(log.contains("[dry run] would create"));
    }
}

//! Task: fast-forward the dotfiles repository.
use anyhow::Result;

use super::{Component, Context, Task, TaskResult};

/// Pull latest changes from the remote repository.
#[derive(Debug)]
pub struct UpdateRepository;

impl Task for UpdateRepository {
    fn name(&self) -> &'static str {
        "Update repository"
    }

    fn component(&self) -> Component {
        Component::Update
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.root().join(".git").exists() && ctx.executor.which("git")
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let root = ctx.root();
        if ctx.dry_run {
            // Compare local HEAD with upstream tracking branch
            if let (Ok(head), Ok(upstream)) = (
                ctx.executor.run_in(root, "git", &["rev-parse", "HEAD"]),
                ctx.executor.run_in(root, "git", &["rev-parse", "@{u}"]),
            ) && head.stdout.trim() == upstream.stdout.trim()
            {
                ctx.log.info("already up to date");
                return Ok(TaskResult::Ok);
            }
            ctx.log.dry_run("git pull --ff-only");
            return Ok(TaskResult::DryRun);
        }

        ctx.log.debug(&format!("pulling in {}", root.display()));
        let retry = ctx.retry();
        let result = retry.run(
            || ctx.executor.run_in(root, "git", &["pull", "--ff-only"]),
            |attempt, e| {
                ctx.log.warn(&format!(
                    "git pull failed ({e:#}), attempt {attempt}/{}",
                    retry.attempts
                ));
            },
        );
        match result {
            Ok(r) => {
                let msg = r.stdout.trim().to_string();
                ctx.log.debug(&format!("git pull output: {msg}"));
                if msg.contains("Already up to date") {
                    ctx.log.info("already up to date");
                } else {
                    ctx.log.info("repository updated");
                }
                Ok(TaskResult::Ok)
            }
            Err(e) => {
                ctx.log.warn(&format!("git pull failed: {e:#}"));
                Ok(TaskResult::Skipped("git pull failed".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    fn repo_context(
        executor: MockExecutor,
    ) -> (
        Context,
        Arc<crate::tasks::test_helpers::RecordingLog>,
        tempfile::TempDir,
        Arc<MockExecutor>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let executor = Arc::new(executor.with_which(true));
        let (ctx, log) = make_context(
            empty_config(dir.path()),
            Os::Linux,
            Arc::clone(&executor) as Arc<dyn crate::exec::Executor>,
        );
        (ctx, log, dir, executor)
    }

    #[test]
    fn not_applicable_without_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_context(
            empty_config(dir.path()),
            Os::Linux,
            Arc::new(MockExecutor::with_responses(vec![]).with_which(true)),
        );
        assert!(!UpdateRepository.should_run(&ctx));
    }

    #[test]
    fn pull_reports_up_to_date() {
        let (ctx, log, _dir, executor) = repo_context(MockExecutor::ok("Already up to date."));
        assert!(matches!(UpdateRepository.run(&ctx).unwrap(), TaskResult::Ok));
        assert!(log.contains("already up to date"));
        assert_eq!(executor.calls(), vec!["git pull --ff-only"]);
    }

    #[test]
    fn pull_retries_then_skips() {
        let (ctx, log, _dir, executor) = repo_context(MockExecutor::with_responses(vec![]));
        let result = UpdateRepository.run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::Skipped(_)));
        assert_eq!(executor.call_count(), 2);
        assert!(log.contains("attempt 2/2"));
    }

    #[test]
    fn dry_run_does_not_pull() {
        let (mut ctx, log, _dir, executor) = repo_context(MockExecutor::with_responses(vec![
            (true, "aaa".to_string()),
            (true, "bbb".to_string()),
        ]));
        ctx.dry_run = true;
        assert!(matches!(
            UpdateRepository.run(&ctx).unwrap(),
            TaskResult::DryRun
        ));
        assert!(log.contains("[dry run] git pull --ff-only"));
        assert!(executor.calls().iter().all(|c| !c.contains("pull")));
    }
}

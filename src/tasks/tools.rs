//! Task: install tools through winget.
use anyhow::Result;

use super::{Component, Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::tool::ToolResource;

/// Package manager used for tools.
const WINGET: &str = "winget";

/// Install configured tools through winget.
#[derive(Debug)]
pub struct InstallTools;

impl Task for InstallTools {
    fn name(&self) -> &'static str {
        "Install tools"
    }

    fn component(&self) -> Component {
        Component::Tools
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows() && !ctx.config.tools.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.executor.which(WINGET) {
            return Ok(TaskResult::Skipped(format!("{WINGET} not found")));
        }
        let retry = ctx.retry();
        let resources = ctx.config.tools.iter().map(|tool| {
            ToolResource::new(
                tool.id.clone(),
                tool.command.clone(),
                ctx.executor.as_ref(),
                ctx.log.as_ref(),
                retry,
            )
        });
        Ok(process_resources(
            ctx,
            resources,
            &ProcessOpts::install_missing("install"),
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
    use crate::config::Tool;
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::path::Path;
    use std::sync::Arc;

    fn config_with_tools() -> crate::config::Config {
        let mut config = empty_config(Path::new("/dotfiles"));
        config.tools = vec![
            Tool {
                id: "Git.Git".to_string(),
                command: Some("git".to_string()),
            },
            Tool {
                id: "JanDeDobbeleer.OhMyPosh".to_string(),
                command: None,
            },
        ];
        config
    }

    #[test]
    fn only_runs_on_windows() {
        let executor = Arc::new(MockExecutor::with_responses(vec![]));
        let (linux, _) = make_context(config_with_tools(), Os::Linux, executor.clone());
        let (windows, _) = make_context(config_with_tools(), Os::Windows, executor);
        assert!(!InstallTools.should_run(&linux));
        assert!(InstallTools.should_run(&windows));
    }

    #[test]
    fn skipped_without_winget() {
        let (ctx, _) = make_context(
            config_with_tools(),
            Os::Windows,
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        assert!(matches!(
            InstallTools.run(&ctx).unwrap(),
            TaskResult::Skipped(reason) if reason == "winget not found"
        ));
    }

    #[test]
    fn installs_only_missing_tools() {
        // which() is true for every program, so Git is found on PATH; the
        // second tool has no command and falls back to winget list.
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, "No installed package found".to_string()),
                (true, "Successfully installed".to_string()),
            ])
            .with_which(true),
        );
        let (ctx, log) = make_context(
            config_with_tools(),
            Os::Windows,
            Arc::clone(&executor) as Arc<dyn crate::exec::Executor>,
        );
        let TaskResult::Done(stats) = InstallTools.run(&ctx).unwrap() else {
            panic!("expected counters");
        };
        assert_eq!(stats.already_ok, 1);
        assert_eq!(stats.changed, 1);
        assert!(executor.calls()[1].starts_with("winget install --id JanDeDobbeleer.OhMyPosh"));
        assert!(log.contains("install: JanDeDobbeleer.OhMyPosh"));
    }

    #[test]
    fn failed_install_is_counted_not_fatal() {
        let executor = Arc::new(
            MockExecutor::with_responses(vec![(true, String::new())]).with_which(true),
        );
        let mut config = config_with_tools();
        config.tools.remove(0);
        let (ctx, log) = make_context(config, Os::Windows, executor);
        let TaskResult::Done(stats) = InstallTools.run(&ctx).unwrap() else {
            panic!("expected counters");
        };
        assert_eq!(stats.failed, 1);
        assert!(log.contains(
            "[warn] winget install JanDeDobbeleer.OhMyPosh failed (mock command failed), attempt 2/2"
        ));
        assert!(log.contains("[warn] failed to install JanDeDobbeleer.OhMyPosh"));
    }
}

//! Task: install PowerShell modules.
use anyhow::Result;

use super::{Component, Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::module::{ModuleResource, POWERSHELL};

/// Install configured PowerShell modules for the current user.
#[derive(Debug)]
pub struct InstallModules;

impl Task for InstallModules {
    fn name(&self) -> &'static str {
        "Install PowerShell modules"
    }

    fn component(&self) -> Component {
        Component::Modules
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.modules.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.executor.which(POWERSHELL) {
            return Ok(TaskResult::Skipped(format!("{POWERSHELL} not found")));
        }
        let retry = ctx.retry();
        let resources = ctx
            .config
            .modules
            .iter()
            .map(|name| {
                ModuleResource::new(
                    name.clone(),
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
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::path::Path;
    use std::sync::Arc;

    fn config() -> crate::config::Config {
        let mut config = empty_config(Path::new("/dotfiles"));
        config.modules = vec!["Terminal-Icons".to_string(), "posh-git".to_string()];
        config
    }

    #[test]
    fn not_applicable_without_modules() {
        let (ctx, _) = make_context(
            empty_config(Path::new("/dotfiles")),
            Os::Windows,
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        assert!(!InstallModules.should_run(&ctx));
    }

    #[test]
    fn skipped_without_powershell() {
        let (ctx, _) = make_context(
            config(),
            Os::Linux,
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        assert!(matches!(
            InstallModules.run(&ctx).unwrap(),
            TaskResult::Skipped(reason) if reason == "pwsh not found"
        ));
    }

    #[test]
    fn retried_install_is_reported() {
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, String::new()),
                (false, String::new()),
                (true, String::new()),
            ])
            .with_which(true),
        );
        let mut config = config();
        config.modules.truncate(1);
        let (ctx, log) = make_context(config, Os::Windows, executor);
        let TaskResult::Done(stats) = InstallModules.run(&ctx).unwrap() else {
            panic!("expected counters");
        };
        assert_eq!(stats.changed, 1);
        assert!(log.contains("[warn] Install-Module Terminal-Icons failed"));
        assert!(log.contains("attempt 2/2"));
    }

    #[test]
    fn installs_missing_module() {
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, "Script 0.11.0 Terminal-Icons".to_string()),
                (true, String::new()),
                (true, String::new()),
            ])
            .with_which(true),
        );
        let (ctx, _) = make_context(
            config(),
            Os::Windows,
            Arc::clone(&executor) as Arc<dyn crate::exec::Executor>,
        );
        let TaskResult::Done(stats) = InstallModules.run(&ctx).unwrap() else {
            panic!("expected counters");
        };
        assert_eq!(stats.already_ok, 1);
        assert_eq!(stats.changed, 1);
        assert!(executor.calls()[2].contains("Install-Module -Name 'posh-git'"));
    }
}

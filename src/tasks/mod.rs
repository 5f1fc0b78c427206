//! Named, ordered tasks that orchestrate resource changes.
mod context;
pub mod directories;
pub mod modules;
mod processing;
pub mod symlinks;
pub mod tools;
pub mod update;

pub use context::Context;
pub use processing::{
    ProcessOpts, TaskResult, TaskStats, process_resource_states, process_resources,
};

use std::fmt;

use anyhow::Result;

use crate::logging::TaskStatus;

/// The independently selectable parts of an install run.
///
/// Skip flags and interactive prompts operate on components rather than on
/// individual tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Pull the dotfiles repository.
    Update,
    /// Package-manager tools.
    Tools,
    /// PowerShell modules.
    Modules,
    /// Required directories.
    Directories,
    /// Symlinks.
    Links,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Update => "repository update",
            Self::Tools => "tools",
            Self::Modules => "PowerShell modules",
            Self::Directories => "directories",
            Self::Links => "symlinks",
        })
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Which part of the run this task belongs to.
    fn component(&self) -> Component;

    /// Whether this task should run on the current platform and config.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task as a whole cannot run. Failures of
    /// individual items are counted in [`TaskStats`] instead.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The complete set of tasks run by the install command, in execution order.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(update::UpdateRepository),
        Box::new(tools::InstallTools),
        Box::new(modules::InstallModules),
        Box::new(directories::CreateDirectories),
        Box::new(symlinks::InstallSymlinks),
    ]
}

/// Execute a task, recording the result in the logger.
pub fn execute(task: &dyn Task, ctx: &Context) {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Ok(TaskResult::Done(stats)) => {
            let outcome = if ctx.dry_run {
                TaskStatus::DryRun
            } else {
                TaskStatus::Ok
            };
            ctx.log.record_task(task.name(), outcome, None);
            ctx.log.record_stats(task.name(), &stats);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
        }
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::context_with;
    use super::*;

    struct FixedTask {
        applies: bool,
        result: fn() -> Result<TaskResult>,
    }

    impl Task for FixedTask {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn component(&self) -> Component {
            Component::Links
        }
        fn should_run(&self, _: &Context) -> bool {
            self.applies
        }
        fn run(&self, _: &Context) -> Result<TaskResult> {
            (self.result)()
        }
    }

    #[test]
    fn install_tasks_run_in_component_order() {
        let components: Vec<Component> =
            all_install_tasks().iter().map(|t| t.component()).collect();
        assert_eq!(
            components,
            vec![
                Component::Update,
                Component::Tools,
                Component::Modules,
                Component::Directories,
                Component::Links,
            ]
        );
    }

    #[test]
    fn execute_records_not_applicable() {
        let (ctx, log) = context_with(Vec::new());
        let task = FixedTask {
            applies: false,
            result: || Ok(TaskResult::Ok),
        };
        execute(&task, &ctx);
        assert_eq!(log.tasks()[0].status, TaskStatus::NotApplicable);
        assert!(!log.contains("==> fixed"));
    }

    #[test]
    fn execute_records_stats_for_done() {
        let (ctx, log) = context_with(Vec::new());
        let task = FixedTask {
            applies: true,
            result: || {
                Ok(TaskResult::Done(TaskStats {
                    changed: 2,
                    ..TaskStats::default()
                }))
            },
        };
        execute(&task, &ctx);
        let entry = &log.tasks()[0];
        assert_eq!(entry.status, TaskStatus::Ok);
        assert_eq!(entry.stats.as_ref().map(|s| s.changed), Some(2));
        assert!(log.contains("==> fixed"));
    }

    #[test]
    fn execute_records_failure_message() {
        let (ctx, log) = context_with(Vec::new());
        let task = FixedTask {
            applies: true,
            result: || Err(anyhow::anyhow!("boom")),
        };
        execute(&task, &ctx);
        let entry = &log.tasks()[0];
        assert_eq!(entry.status, TaskStatus::Failed);
        assert_eq!(entry.message.as_deref(), Some("boom"));
        assert!(log.contains("[error] fixed: boom"));
    }

    #[test]
    fn execute_records_skip_reason() {
        let (ctx, log) = context_with(Vec::new());
        let task = FixedTask {
            applies: true,
            result: || Ok(TaskResult::Skipped("pwsh not found".to_string())),
        };
        execute(&task, &ctx);
        assert_eq!(log.tasks()[0].status, TaskStatus::Skipped);
        assert!(log.contains("skipped: pwsh not found"));
    }

    #[test]
    fn component_display() {
        assert_eq!(Component::Links.to_string(), "symlinks");
        assert_eq!(Component::Modules.to_string(), "PowerShell modules");
    }
}

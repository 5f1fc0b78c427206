//! Command: install everything the manifest describes.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, preflight};
use crate::cli::GlobalOpts;
use crate::error::PreconditionError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger, TaskStatus};
use crate::prompt::{InquirePrompt, Prompt};
use crate::resources::developer_mode::DeveloperMode;
use crate::tasks::{self, Component, Context, Task};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if a precondition fails (missing manifest, missing
/// required source, no elevation, declined prompt). Per-item failures are
/// reported in the summary and do not fail the command.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("dotfiles-setup {}", super::version::version()));

    let setup = CommandSetup::init(global, log.as_ref())?;
    let developer_mode = || {
        DeveloperMode.is_enabled().unwrap_or_else(|e| {
            log.warn(&format!(
                "cannot read {}: {e:#}",
                DeveloperMode.description()
            ));
            false
        })
    };

    run_with(
        setup,
        global,
        Arc::clone(log) as Arc<dyn Log>,
        Arc::new(SystemExecutor),
        &InquirePrompt,
        developer_mode,
    )?;

    log.print_summary();
    if log.has_failures() {
        log.warn("one or more tasks failed; see the log for details");
    }
    Ok(())
}

/// Run preflight checks, ask for confirmation, and execute the selected tasks.
///
/// Components are selected first, so the privilege check only applies when
/// links will actually be created.
///
/// # Errors
///
/// Returns an error if a precondition fails or the user declines.
pub fn run_with(
    setup: CommandSetup,
    global: &GlobalOpts,
    log: Arc<dyn Log>,
    executor: Arc<dyn Executor>,
    prompt: &dyn Prompt,
    developer_mode: impl FnOnce() -> bool,
) -> Result<()> {
    log.stage("Checking preconditions");
    if !global.skip_links {
        preflight::check_required_sources(&setup.config, log.as_ref())?;
    }

    if !global.yes && !global.dry_run {
        let question = format!("Set up dotfiles from {}?", setup.config.root.display());
        if !prompt.confirm(&question, true)? {
            return Err(PreconditionError::Declined.into());
        }
    }

    let ctx = Context::new(
        Arc::new(setup.config),
        Arc::new(setup.platform),
        log,
        global.dry_run,
        setup.home,
        executor,
    );

    let all = tasks::all_install_tasks();
    let selected = select_tasks(&all, &ctx, global, prompt)?;
    let links_selected = selected
        .iter()
        .any(|task| task.component() == Component::Links && task.should_run(&ctx));
    if links_selected && !ctx.dry_run {
        preflight::check_privileges(
            &ctx.platform,
            ctx.executor.as_ref(),
            developer_mode,
            ctx.log.as_ref(),
        )?;
    }

    for task in selected {
        tasks::execute(task, &ctx);
    }
    Ok(())
}

/// Filter tasks by skip flags and, in interactive mode, by the user's answers.
///
/// Tasks left out are recorded as skipped so they appear in the summary.
fn select_tasks<'a>(
    all: &'a [Box<dyn Task>],
    ctx: &Context,
    global: &GlobalOpts,
    prompt: &dyn Prompt,
) -> Result<Vec<&'a dyn Task>> {
    let mut selected = Vec::new();
    for task in all {
        let task = task.as_ref();
        let component = task.component();
        if let Some(flag) = excluded_by(global, component) {
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(flag));
            continue;
        }
        if global.interactive
            && component != Component::Update
            && task.should_run(ctx)
            && !prompt.confirm(&format!("Set up {component}?"), true)?
        {
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some("declined"));
            continue;
        }
        selected.push(task);
    }
    Ok(selected)
}

/// The flag that excludes `component`, if it is set.
const fn excluded_by(global: &GlobalOpts, component: Component) -> Option<&'static str> {
    match component {
        Component::Update if global.skip_update => Some("--skip-update"),
        Component::Tools | Component::Modules if global.skip_tools => Some("--skip-tools"),
        Component::Links if global.skip_links => Some("--skip-links"),
        _ => None,
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
    use crate::config::DEFAULT_MANIFEST;
    use crate::platform::{Os, Platform};
    use crate::prompt::MockPrompt;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::RecordingLog;
    use std::path::Path;

    struct Repo {
        dir: tempfile::TempDir,
    }

    impl Repo {
        fn new(manifest: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("conf")).unwrap();
            std::fs::create_dir_all(dir.path().join("home")).unwrap();
            std::fs::write(dir.path().join(DEFAULT_MANIFEST), manifest).unwrap();
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn setup(&self, os: Os) -> CommandSetup {
            CommandSetup::load(
                &GlobalOpts::default(),
                &RecordingLog::default(),
                Platform::new(os),
                self.path(),
                self.path().join("home"),
            )
            .unwrap()
        }
    }

    const MANIFEST: &str = r#"
[[directories]]
path = "~/.config"

[[links]]
source = "profile.ps1"
target = "~/Documents/profile.ps1"
label = "PowerShell profile"
"#;

    fn never_asked() -> MockPrompt {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().never();
        prompt
    }

    fn status_of(log: &RecordingLog, name: &str) -> Option<(TaskStatus, Option<String>)> {
        log.tasks()
            .into_iter()
            .find(|t| t.name == name)
            .map(|t| (t.status, t.message))
    }

    #[test]
    fn excluded_by_maps_flags_to_components() {
        let global = GlobalOpts {
            skip_tools: true,
            ..GlobalOpts::default()
        };
        assert_eq!(excluded_by(&global, Component::Tools), Some("--skip-tools"));
        assert_eq!(
            excluded_by(&global, Component::Modules),
            Some("--skip-tools")
        );
        assert_eq!(excluded_by(&global, Component::Links), None);
        assert_eq!(excluded_by(&global, Component::Directories), None);
    }

    #[test]
    fn required_source_missing_aborts_before_any_change() {
        let repo = Repo::new(
            "[[links]]\nsource = \"profile.ps1\"\ntarget = \"~/p.ps1\"\nrequired = true\n",
        );
        let log = Arc::new(RecordingLog::default());
        let global = GlobalOpts {
            yes: true,
            ..GlobalOpts::default()
        };
        let err = run_with(
            repo.setup(Os::Linux),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &never_asked(),
            || false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("profile.ps1"));
        assert!(log.tasks().is_empty());
    }

    #[test]
    fn unprivileged_windows_aborts() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let global = GlobalOpts {
            yes: true,
            ..GlobalOpts::default()
        };
        let err = run_with(
            repo.setup(Os::Windows),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![(false, String::new())])),
            &never_asked(),
            || false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::NotElevated)
        ));
        assert!(!repo.path().join("home/.config").exists());
    }

    #[test]
    fn unprivileged_interactive_run_without_links_proceeds() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .withf(|msg, _| msg == "Set up directories?")
            .times(1)
            .returning(|_, _| Ok(true));
        prompt
            .expect_confirm()
            .withf(|msg, _| msg == "Set up symlinks?")
            .times(1)
            .returning(|_, _| Ok(false));
        let global = GlobalOpts {
            yes: true,
            interactive: true,
            ..GlobalOpts::default()
        };
        let executor = Arc::new(MockExecutor::with_responses(vec![]));
        run_with(
            repo.setup(Os::Windows),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::clone(&executor) as Arc<dyn Executor>,
            &prompt,
            || panic!("privileges are not needed without links"),
        )
        .unwrap();
        assert!(repo.path().join("home/.config").is_dir());
        assert!(!executor.calls().iter().any(|c| c.starts_with("net")));
        assert_eq!(
            status_of(&log, "Install symlinks"),
            Some((TaskStatus::Skipped, Some("declined".to_string())))
        );
    }

    #[test]
    fn unprivileged_interactive_run_with_links_aborts_before_changes() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(2).returning(|_, _| Ok(true));
        let global = GlobalOpts {
            yes: true,
            interactive: true,
            ..GlobalOpts::default()
        };
        let err = run_with(
            repo.setup(Os::Windows),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![(false, String::new())])),
            &prompt,
            || false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::NotElevated)
        ));
        assert!(!repo.path().join("home/.config").exists());
    }

    #[test]
    fn declined_confirmation_aborts() {
        let repo = Repo::new(MANIFEST);
        let log = Arc::new(RecordingLog::default());
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .times(1)
            .returning(|_, _| Ok(false));
        let err = run_with(
            repo.setup(Os::Linux),
            &GlobalOpts::default(),
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &prompt,
            || false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::Declined)
        ));
        assert!(!repo.path().join("home/.config").exists());
    }

    #[test]
    fn dry_run_skips_confirmation_and_changes_nothing() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let global = GlobalOpts {
            dry_run: true,
            ..GlobalOpts::default()
        };
        run_with(
            repo.setup(Os::Linux),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &never_asked(),
            || false,
        )
        .unwrap();
        assert!(!repo.path().join("home/.config").exists());
        assert!(!repo.path().join("home/Documents").exists());
        assert_eq!(
            status_of(&log, "Install symlinks").map(|s| s.0),
            Some(TaskStatus::DryRun)
        );
    }

    #[test]
    fn skip_links_is_recorded_and_required_check_is_skipped() {
        let repo = Repo::new(
            "[[directories]]\npath = \"~/.config\"\n\n[[links]]\nsource = \"gone\"\ntarget = \"~/gone\"\nrequired = true\n",
        );
        let log = Arc::new(RecordingLog::default());
        let global = GlobalOpts {
            yes: true,
            skip_links: true,
            ..GlobalOpts::default()
        };
        run_with(
            repo.setup(Os::Linux),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &never_asked(),
            || false,
        )
        .unwrap();
        assert!(repo.path().join("home/.config").is_dir());
        assert_eq!(
            status_of(&log, "Install symlinks"),
            Some((TaskStatus::Skipped, Some("--skip-links".to_string())))
        );
    }

    #[cfg(unix)]
    #[test]
    fn interactive_asks_per_applicable_component() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .withf(|msg, _| msg == "Set up directories?")
            .times(1)
            .returning(|_, _| Ok(false));
        prompt
            .expect_confirm()
            .withf(|msg, _| msg == "Set up symlinks?")
            .times(1)
            .returning(|_, _| Ok(true));
        let global = GlobalOpts {
            yes: true,
            interactive: true,
            ..GlobalOpts::default()
        };
        run_with(
            repo.setup(Os::Linux),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &prompt,
            || false,
        )
        .unwrap();
        assert!(!repo.path().join("home/.config").exists());
        assert_eq!(
            status_of(&log, "Create directories"),
            Some((TaskStatus::Skipped, Some("declined".to_string())))
        );
        assert_eq!(
            status_of(&log, "Install symlinks").map(|s| s.0),
            Some(TaskStatus::Ok)
        );
    }

    #[cfg(unix)]
    #[test]
    fn full_run_creates_directories_and_links() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.path().join("profile.ps1"), "x").unwrap();
        let log = Arc::new(RecordingLog::default());
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .times(1)
            .returning(|_, _| Ok(true));
        run_with(
            repo.setup(Os::Linux),
            &GlobalOpts::default(),
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(MockExecutor::with_responses(vec![])),
            &prompt,
            || false,
        )
        .unwrap();

        let target = repo.path().join("home/Documents/profile.ps1");
        assert!(repo.path().join("home/.config").is_dir());
        assert_eq!(
            std::fs::read_link(&target).unwrap(),
            repo.path().join("profile.ps1")
        );
        assert_eq!(
            status_of(&log, "Update repository").map(|s| s.0),
            Some(TaskStatus::NotApplicable)
        );
    }
}

// Shared helpers for integration tests.
//
// Provides a temporary dotfiles repository with its own home directory and a
// fluent builder, so each integration test runs in an isolated environment
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotfiles_setup::cli::GlobalOpts;
use dotfiles_setup::commands::CommandSetup;
use dotfiles_setup::config::DEFAULT_MANIFEST;
use dotfiles_setup::exec::{ExecResult, Executor};
use dotfiles_setup::logging::{Log, Logger};
use dotfiles_setup::platform::{Os, Platform};
use dotfiles_setup::prompt::Prompt;

/// An [`Executor`] for hosts without the Windows tooling: every program is
/// absent from PATH and every call fails.
#[derive(Debug, Default)]
pub struct NoTools;

impl Executor for NoTools {
    fn run(&self, program: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
        anyhow::bail!("{program} is not available in tests")
    }

    fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run(program, args)
    }

    fn which(&self, _: &str) -> bool {
        false
    }
}

/// A [`Prompt`] for runs that must not ask anything.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn confirm(&self, message: &str, _: bool) -> anyhow::Result<bool> {
        anyhow::bail!("unexpected prompt: {message}")
    }
}

/// An isolated dotfiles repository backed by a [`tempfile::TempDir`].
///
/// The repository lives in `<tmp>/repo` and the fake home directory in
/// `<tmp>/home`; both are deleted when the context is dropped.
pub struct IntegrationTestContext {
    tmp: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Path to the repository root.
    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("repo")
    }

    /// Path to the fake home directory.
    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    /// Load the manifest as the given platform would see it.
    pub fn setup(&self, os: Os) -> CommandSetup {
        CommandSetup::load(
            &GlobalOpts::default(),
            &Logger::with_log_file(None),
            Platform::new(os),
            &self.root(),
            self.home(),
        )
        .expect("load manifest")
    }

    /// Run the install command without prompts, returning the logger that
    /// recorded the run.
    pub fn install(&self, os: Os, global: &GlobalOpts) -> anyhow::Result<Arc<Logger>> {
        let log = Arc::new(Logger::with_log_file(None));
        let global = GlobalOpts {
            yes: true,
            ..global.clone()
        };
        dotfiles_setup::commands::install::run_with(
            self.setup(os),
            &global,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(NoTools),
            &NoPrompt,
            || false,
        )?;
        Ok(log)
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a repository with an empty manifest.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let ctx = IntegrationTestContext { tmp };
        std::fs::create_dir_all(ctx.root().join("conf")).expect("create conf dir");
        std::fs::create_dir_all(ctx.home()).expect("create home dir");
        std::fs::write(ctx.root().join(DEFAULT_MANIFEST), "").expect("write manifest");
        Self { ctx }
    }

    /// Replace the manifest with `content`.
    pub fn with_manifest(self, content: &str) -> Self {
        std::fs::write(self.ctx.root().join(DEFAULT_MANIFEST), content).expect("write manifest");
        self
    }

    /// Create a file in the repository.
    pub fn with_source(self, relative: &str, content: &str) -> Self {
        write_file(&self.ctx.root().join(relative), content);
        self
    }

    /// Create a file in the fake home directory.
    pub fn with_home_file(self, relative: &str, content: &str) -> Self {
        write_file(&self.ctx.home().join(relative), content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

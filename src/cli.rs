//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the dotfiles bootstrap.
#[derive(Parser, Debug)]
#[command(
    name = "dotfiles-setup",
    about = "Install tools, modules, directories and symlinks from a dotfiles repository",
    version
)]
pub struct Cli {
    /// Command to run (defaults to `install`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

impl Cli {
    /// The command to run, with `install` as the default.
    #[must_use]
    pub fn selected(&self) -> Command {
        self.command.unwrap_or(Command::Install)
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Ask before each component (tools, modules, directories, links)
    #[arg(short, long, global = true)]
    pub interactive: bool,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Skip tool and module installation
    #[arg(long, global = true)]
    pub skip_tools: bool,

    /// Skip symlink creation
    #[arg(long, global = true)]
    pub skip_links: bool,

    /// Skip pulling the dotfiles repository
    #[arg(long, global = true)]
    pub skip_update: bool,

    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Manifest file (default: <root>/conf/bootstrap.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Install tools, modules, directories and symlinks
    Install,
    /// Report the state of every symlink without changing anything
    Status,
    /// Print version information
    Version,
}

impl Command {
    /// Short name, used for the run log file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Status => "status",
            Self::Version => "version",
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn install_is_the_default() {
        let cli = Cli::parse_from(["dotfiles-setup"]);
        assert_eq!(cli.selected(), Command::Install);
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["dotfiles-setup", "-d"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_skip_flags() {
        let cli = Cli::parse_from([
            "dotfiles-setup",
            "install",
            "--skip-tools",
            "--skip-links",
            "--skip-update",
        ]);
        assert!(cli.global.skip_tools);
        assert!(cli.global.skip_links);
        assert!(cli.global.skip_update);
    }

    #[test]
    fn parse_interactive_and_yes() {
        let cli = Cli::parse_from(["dotfiles-setup", "-i", "-y"]);
        assert!(cli.global.interactive);
        assert!(cli.global.yes);
    }

    #[test]
    fn parse_status() {
        let cli = Cli::parse_from(["dotfiles-setup", "status"]);
        assert_eq!(cli.selected(), Command::Status);
        assert_eq!(cli.selected().name(), "status");
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["dotfiles-setup", "version"]);
        assert_eq!(cli.selected(), Command::Version);
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["dotfiles-setup", "status", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_root_and_config_override() {
        let cli = Cli::parse_from([
            "dotfiles-setup",
            "--root",
            "/tmp/dotfiles",
            "--config",
            "/tmp/other.toml",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/dotfiles")));
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/other.toml")));
    }
}

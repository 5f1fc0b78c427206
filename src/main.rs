//! `dotfiles-setup` binary.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotfiles_setup::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let command = args.selected();
    logging::init_subscriber(args.verbose, command.name());
    let log = Arc::new(logging::Logger::new(command.name()));

    match command {
        cli::Command::Install => commands::install::run(&args.global, &log),
        cli::Command::Status => commands::status::run(&args.global, log.as_ref()),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}

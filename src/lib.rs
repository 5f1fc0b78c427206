//! Dotfiles bootstrap engine.
//!
//! Installs command-line tools and PowerShell modules, creates directories,
//! and links files from a dotfiles repository into their expected locations.
//! Everything is driven by one TOML manifest (`conf/bootstrap.toml`) and every
//! step is idempotent: a second run reports what is already in place and
//! changes nothing.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse, resolve and validate the manifest
//! - **[`resources`]**: idempotent `check + apply` primitives (symlink, tool, module, directory)
//! - **[`tasks`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `status`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod resources;
pub mod tasks;

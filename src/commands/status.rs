//! Command: report the state of every configured link.
use anyhow::{Result, bail};

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::logging::Log;
use crate::resources::symlink::LinkState;
use crate::tasks::symlinks::inspect_links;

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the root, home or manifest cannot be resolved, or if
/// any link is still pending so scripts can test the exit code.
pub fn run(global: &GlobalOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    ensure_in_place(report(&setup.config, log))
}

fn ensure_in_place(pending: usize) -> Result<()> {
    if pending > 0 {
        bail!("{pending} link(s) not in place; run install to fix");
    }
    Ok(())
}

/// Log one line per link and a closing tally. Returns how many links are
/// not yet in place.
pub fn report(config: &Config, log: &dyn Log) -> usize {
    log.stage("Link status");
    let mut pending = 0;
    let mut in_place = 0;
    for (resource, state) in inspect_links(config) {
        let line = format!(
            "{}: {state} ({})",
            resource.label,
            resource.target.display()
        );
        match state {
            LinkState::SameLocation | LinkState::Linked => {
                in_place += 1;
                log.info(&line);
            }
            LinkState::SourceMissing => log.info(&line),
            LinkState::Nested => log.warn(&line),
            LinkState::Absent | LinkState::OtherLink(_) | LinkState::Occupied { .. } => {
                pending += 1;
                log.warn(&line);
            }
        }
    }
    log.info(&format!("{in_place} in place, {pending} pending"));
    pending
}

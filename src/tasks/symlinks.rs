//! Task: synchronize links, and the shared link inspection used by `status`.
use anyhow::Result;

use super::{
    Component, Context, ProcessOpts, Task, TaskResult, TaskStats, process_resource_states,
};
use crate::config::Config;
use crate::resources::symlink::{LinkState, SymlinkResource};

/// Build one resource per configured link.
pub fn link_resources(config: &Config) -> impl Iterator<Item = SymlinkResource> + '_ {
    config
        .links
        .iter()
        .map(|l| SymlinkResource::new(l.source.clone(), l.target.clone(), l.label.clone()))
}

/// Inspect every configured link without changing anything.
#[must_use]
pub fn inspect_links(config: &Config) -> Vec<(SymlinkResource, LinkState)> {
    link_resources(config)
        .map(|r| {
            let state = r.inspect();
            (r, state)
        })
        .collect()
}

/// Synchronize every configured link into place.
#[derive(Debug)]
pub struct InstallSymlinks;

impl Task for InstallSymlinks {
    fn name(&self) -> &'static str {
        "Install symlinks"
    }

    fn component(&self) -> Component {
        Component::Links
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        let mut pending = Vec::new();

        for (resource, state) in inspect_links(&ctx.config) {
            match state {
                LinkState::SourceMissing => {
                    ctx.log.info(&format!(
                        "{}: {state} ({})",
                        resource.label,
                        resource.source.display()
                    ));
                    stats.skipped += 1;
                }
                LinkState::Nested => {
                    ctx.log.warn(&format!(
                        "{}: {state} ({} -> {})",
                        resource.label,
                        resource.target.display(),
                        resource.source.display()
                    ));
                    stats.skipped += 1;
                }
                LinkState::SameLocation | LinkState::Linked => {
                    ctx.log.info(&format!("{}: {state}", resource.label));
                    stats.already_ok += 1;
                }
                LinkState::Absent | LinkState::OtherLink(_) | LinkState::Occupied { .. } => {
                    if ctx.dry_run && matches!(state, LinkState::Occupied { .. }) {
                        stats.backed_up += 1;
                    }
                    let current = state.to_resource_state(&resource.source);
                    pending.push((resource, current));
                }
            }
        }

        stats += process_resource_states(ctx, pending, &ProcessOpts::apply_all("link"));
        Ok(stats.finish(ctx))
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
    use crate::config::LinkSpec;
    use crate::tasks::test_helpers::context_with;
    use std::path::Path;

    fn link(dir: &Path, source: &str, target: &str) -> LinkSpec {
        LinkSpec {
            source: dir.join(source),
            target: dir.join(target),
            label: source.to_string(),
            required: false,
        }
    }

    fn stats_of(result: TaskResult) -> TaskStats {
        match result {
            TaskResult::Done(stats) => stats,
            other => panic!("expected counters, got {other:?}"),
        }
    }

    #[test]
    fn not_applicable_without_links() {
        let (ctx, _) = context_with(Vec::new());
        assert!(!InstallSymlinks.should_run(&ctx));
    }

    #[test]
    fn missing_source_is_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, log) = context_with(vec![link(dir.path(), "absent", "target")]);
        let stats = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(stats.skipped, 1);
        assert!(log.contains("absent: skipped, source missing"));
        assert!(!dir.path().join("target").exists());
    }

    #[test]
    fn same_location_is_reported_as_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file"), "x").unwrap();
        let (ctx, log) = context_with(vec![link(dir.path(), "file", "file")]);
        let stats = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(stats.already_ok, 1);
        assert!(log.contains("file: already in place"));
    }

    #[test]
    fn target_holding_the_repository_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("PowerShell/dotfiles")).unwrap();
        std::fs::write(dir.path().join("PowerShell/dotfiles/profile.ps1"), "x").unwrap();
        let (ctx, log) = context_with(vec![LinkSpec {
            source: dir.path().join("PowerShell/dotfiles/profile.ps1"),
            target: dir.path().join("PowerShell"),
            label: "profile".to_string(),
            required: false,
        }]);

        let stats = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(
            stats,
            TaskStats {
                skipped: 1,
                ..TaskStats::default()
            }
        );
        assert!(log.contains("[warn] profile: skipped, source and target are nested"));
        assert!(
            dir.path()
                .join("PowerShell/dotfiles/profile.ps1")
                .is_file()
        );
    }

    #[cfg(unix)]
    #[test]
    fn links_backs_up_and_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "a").unwrap();
        std::fs::write(dir.path().join("b"), "b").unwrap();
        std::fs::write(dir.path().join("b-target"), "old").unwrap();
        let (ctx, log) = context_with(vec![
            link(dir.path(), "a", "a-target"),
            link(dir.path(), "b", "b-target"),
        ]);

        let stats = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(
            stats,
            TaskStats {
                changed: 2,
                backed_up: 1,
                ..TaskStats::default()
            }
        );
        assert!(log.contains("previous moved to"));

        let again = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(again.already_ok, 2);
        assert_eq!(again.changed, 0);
        assert!(log.contains("a: already linked"));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "a").unwrap();
        std::fs::write(dir.path().join("a-target"), "keep").unwrap();
        let (mut ctx, log) = context_with(vec![link(dir.path(), "a", "a-target")]);
        ctx.dry_run = true;

        let stats = stats_of(InstallSymlinks.run(&ctx).unwrap());
        assert_eq!(
            stats,
            TaskStats {
                changed: 1,
                backed_up: 1,
                ..TaskStats::default()
            }
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a-target")).unwrap(),
            "keep"
        );
        assert!(log.contains("(currently existing file)"));
        assert!(log.contains("1 would change, 1 would back up, 0 already ok"));
    }

    #[test]
    fn inspect_links_reports_each_state() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "a").unwrap();
        let (ctx, _) = context_with(vec![
            link(dir.path(), "a", "a-target"),
            link(dir.path(), "missing", "m-target"),
        ]);
        let states: Vec<LinkState> = inspect_links(&ctx.config)
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(states, vec![LinkState::Absent, LinkState::SourceMissing]);
    }
}

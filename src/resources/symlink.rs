//! Symlink resource: the safe link synchronizer.
use anyhow::{Context as _, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use super::fs::{
    backup, ensure_parent_dir, is_within, link_destination, remove_link, same_location,
};
use super::{Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;

/// What currently occupies a link target, relative to the desired source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// The source does not exist; nothing will be touched.
    SourceMissing,
    /// Source and target are the same location; linking would be circular.
    SameLocation,
    /// One of source and target lies inside the other; nothing will be touched.
    Nested,
    /// The target is already a link to the source.
    Linked,
    /// Nothing exists at the target.
    Absent,
    /// The target is a link to somewhere else (possibly broken).
    OtherLink(PathBuf),
    /// A regular file or real directory sits at the target.
    Occupied {
        /// Whether the occupant is a directory.
        is_dir: bool,
    },
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceMissing => f.write_str("skipped, source missing"),
            Self::SameLocation => f.write_str("already in place"),
            Self::Nested => f.write_str("skipped, source and target are nested"),
            Self::Linked => f.write_str("already linked"),
            Self::Absent => f.write_str("not linked"),
            Self::OtherLink(dest) => write!(f, "links elsewhere ({})", dest.display()),
            Self::Occupied { is_dir: true } => f.write_str("existing directory"),
            Self::Occupied { is_dir: false } => f.write_str("existing file"),
        }
    }
}

impl LinkState {
    /// Map onto the generic [`ResourceState`] used by the processing loop.
    #[must_use]
    pub fn to_resource_state(&self, source: &Path) -> ResourceState {
        match self {
            Self::SourceMissing => ResourceState::Invalid {
                reason: format!("source missing: {}", source.display()),
            },
            Self::Nested => ResourceState::Invalid {
                reason: self.to_string(),
            },
            Self::SameLocation | Self::Linked => ResourceState::Correct,
            Self::Absent => ResourceState::Missing,
            Self::OtherLink(_) | Self::Occupied { .. } => ResourceState::Incorrect {
                current: self.to_string(),
            },
        }
    }
}

/// A link from `target` to `source`, checked and applied idempotently.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The file or directory the link points to.
    pub source: PathBuf,
    /// Where the link is created.
    pub target: PathBuf,
    /// Display label used in status lines.
    pub label: String,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub fn new(source: PathBuf, target: PathBuf, label: impl Into<String>) -> Self {
        Self {
            source,
            target,
            label: label.into(),
        }
    }

    /// Report what is at the target without touching anything.
    ///
    /// Checks run in a fixed order: a missing source wins over everything,
    /// then a source/target collision or nesting, then whatever occupies the
    /// target. A target directory that holds the source (the repository was
    /// cloned into it) is never backed up.
    #[must_use]
    pub fn inspect(&self) -> LinkState {
        if !self.source.exists() {
            return LinkState::SourceMissing;
        }
        if same_location(&self.source, &self.target) {
            return LinkState::SameLocation;
        }
        if is_within(&self.source, &self.target) || is_within(&self.target, &self.source) {
            return LinkState::Nested;
        }
        match self.target.symlink_metadata() {
            Err(_) => LinkState::Absent,
            Ok(meta) if meta.is_symlink() => match link_destination(&self.target) {
                Some(dest) if same_location(&dest, &self.source) => LinkState::Linked,
                Some(dest) => LinkState::OtherLink(dest),
                None => LinkState::OtherLink(PathBuf::new()),
            },
            Ok(meta) => LinkState::Occupied {
                is_dir: meta.is_dir(),
            },
        }
    }
}

impl Resource for SymlinkResource {
    fn description(&self) -> String {
        format!(
            "{}: {} -> {}",
            self.label,
            self.target.display(),
            self.source.display()
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(self.inspect().to_resource_state(&self.source))
    }

    fn apply(&self) -> Result<ResourceChange> {
        let mut moved = None;
        match self.inspect() {
            state @ (LinkState::SourceMissing | LinkState::Nested) => {
                return Ok(ResourceChange::Skipped {
                    reason: state.to_string(),
                });
            }
            LinkState::SameLocation | LinkState::Linked => {
                return Ok(ResourceChange::AlreadyCorrect);
            }
            LinkState::OtherLink(_) => {
                remove_link(&self.target)
                    .with_context(|| format!("remove existing: {}", self.target.display()))?;
            }
            LinkState::Occupied { .. } => moved = Some(backup(&self.target)?),
            LinkState::Absent => {}
        }

        ensure_parent_dir(&self.target)?;
        create_symlink(&self.source, &self.target).map_err(|e| ResourceError::LinkFailed {
            target: self.target.clone(),
            source_path: self.source.clone(),
            reason: format!("{e:#}"),
        })?;

        Ok(moved.map_or(ResourceChange::Applied, |backup| ResourceChange::BackedUp {
            backup,
        }))
    }
}

/// Create a symlink at `link` pointing to `source`.
fn create_symlink(source: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(source, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                source.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        use crate::exec::{Executor as _, SystemExecutor};

        let is_dir = source.is_dir();
        let result = if is_dir {
            std::os::windows::fs::symlink_dir(source, link)
        } else {
            std::os::windows::fs::symlink_file(source, link)
        };

        if result.is_err() {
            // mklink via cmd.exe: /J (junction) for directories, plain symlink for files
            let link_str = link.to_string_lossy();
            let source_str = source.to_string_lossy();
            let mut args: Vec<&str> = vec!["/c", "mklink"];
            if is_dir {
                args.push("/J");
            }
            args.push(&link_str);
            args.push(&source_str);
            SystemExecutor.run("cmd", &args)?;
        }
    }

    Ok(())
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

    fn resource(dir: &Path, source: &str, target: &str) -> SymlinkResource {
        SymlinkResource::new(dir.join(source), dir.join(target), source)
    }

    #[test]
    fn description_contains_label_and_paths() {
        let r = SymlinkResource::new(
            PathBuf::from("/repo/profile.ps1"),
            PathBuf::from("/home/u/profile.ps1"),
            "PowerShell profile",
        );
        let desc = r.description();
        assert!(desc.starts_with("PowerShell profile: "));
        assert!(desc.contains("/repo/profile.ps1"));
        assert!(desc.contains("/home/u/profile.ps1"));
    }

    #[test]
    fn missing_source_is_invalid_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target"), "keep").unwrap();
        let r = resource(dir.path(), "absent", "target");

        assert_eq!(r.inspect(), LinkState::SourceMissing);
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(matches!(r.apply().unwrap(), ResourceChange::Skipped { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("target")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn same_location_is_correct_and_not_linked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file"), "x").unwrap();
        let r = SymlinkResource::new(
            dir.path().join("file"),
            dir.path().join(".").join("file"),
            "self",
        );

        assert_eq!(r.inspect(), LinkState::SameLocation);
        assert_eq!(r.apply().unwrap(), ResourceChange::AlreadyCorrect);
        assert!(
            !std::fs::symlink_metadata(dir.path().join("file"))
                .unwrap()
                .is_symlink()
        );
    }

    #[test]
    fn target_directory_holding_the_source_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let profile_dir = dir.path().join("PowerShell");
        let source = profile_dir.join("dotfiles/ps");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("profile.ps1"), "x").unwrap();
        let r = SymlinkResource::new(source.clone(), profile_dir.clone(), "PowerShell");

        assert_eq!(r.inspect(), LinkState::Nested);
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(matches!(r.apply().unwrap(), ResourceChange::Skipped { .. }));
        assert!(source.join("profile.ps1").is_file());
        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".bak_"))
            .count();
        assert_eq!(backups, 0);
    }

    #[test]
    fn target_inside_source_directory_is_nested() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("config")).unwrap();
        let r = resource(dir.path(), "config", "config/loop");
        assert_eq!(r.inspect(), LinkState::Nested);
        assert!(!dir.path().join("config/loop").exists());
    }

    #[test]
    fn absent_target_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        let r = resource(dir.path(), "source", "target");
        assert_eq!(r.inspect(), LinkState::Absent);
        assert_eq!(r.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn regular_file_is_occupied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        std::fs::write(dir.path().join("target"), "y").unwrap();
        let r = resource(dir.path(), "source", "target");
        assert_eq!(r.inspect(), LinkState::Occupied { is_dir: false });
        assert_eq!(
            r.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "existing file".to_string()
            }
        );
    }

    #[test]
    fn real_directory_is_occupied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("source")).unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        let r = resource(dir.path(), "source", "target");
        assert_eq!(r.inspect(), LinkState::Occupied { is_dir: true });
    }

    #[cfg(unix)]
    #[test]
    fn apply_creates_link_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        let r = resource(dir.path(), "source", "deep/nested/target");

        assert_eq!(r.apply().unwrap(), ResourceChange::Applied);
        let dest = std::fs::read_link(dir.path().join("deep/nested/target")).unwrap();
        assert_eq!(dest, dir.path().join("source"));
        assert_eq!(r.inspect(), LinkState::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn apply_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        let r = resource(dir.path(), "source", "target");

        r.apply().unwrap();
        assert_eq!(r.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(r.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[cfg(unix)]
    #[test]
    fn apply_backs_up_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "new").unwrap();
        std::fs::write(dir.path().join("target"), "X").unwrap();
        let r = resource(dir.path(), "source", "target");

        let ResourceChange::BackedUp { backup } = r.apply().unwrap() else {
            panic!("expected a backup");
        };
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("target.bak_"), "unexpected name {name}");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "X");
        assert_eq!(r.inspect(), LinkState::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn apply_backs_up_real_directory_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("source")).unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/old.txt"), "old").unwrap();
        let r = resource(dir.path(), "source", "target");

        let ResourceChange::BackedUp { backup } = r.apply().unwrap() else {
            panic!("expected a backup");
        };
        assert_eq!(
            std::fs::read_to_string(backup.join("old.txt")).unwrap(),
            "old"
        );
        assert_eq!(r.inspect(), LinkState::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn apply_replaces_other_link_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        std::fs::write(dir.path().join("other"), "o").unwrap();
        std::os::unix::fs::symlink(dir.path().join("other"), dir.path().join("target")).unwrap();
        let r = resource(dir.path(), "source", "target");

        assert!(matches!(r.inspect(), LinkState::OtherLink(_)));
        assert_eq!(r.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(r.inspect(), LinkState::Linked);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("other")).unwrap(),
            "o"
        );
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".bak_"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn apply_replaces_broken_link() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        std::os::unix::fs::symlink("/nonexistent/place", dir.path().join("target")).unwrap();
        let r = resource(dir.path(), "source", "target");

        assert!(matches!(r.inspect(), LinkState::OtherLink(_)));
        assert_eq!(r.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(r.inspect(), LinkState::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn relative_link_to_source_counts_as_linked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        std::os::unix::fs::symlink("source", dir.path().join("target")).unwrap();
        let r = resource(dir.path(), "source", "target");
        assert_eq!(r.inspect(), LinkState::Linked);
    }

    #[test]
    fn link_state_messages() {
        assert_eq!(LinkState::SourceMissing.to_string(), "skipped, source missing");
        assert_eq!(LinkState::SameLocation.to_string(), "already in place");
        assert_eq!(LinkState::Linked.to_string(), "already linked");
        assert_eq!(
            LinkState::Occupied { is_dir: true }.to_string(),
            "existing directory"
        );
    }
}

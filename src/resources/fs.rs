//! File-system helpers shared by resources: location resolution, backups and
//! platform-aware link removal.
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::error::ResourceError;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Resolve `path` to an absolute location without following its final
/// component.
///
/// The parent directory is canonicalized (so `..`, `.` and symlinked parent
/// directories collapse) while a symlink at `path` itself is left alone.
/// Falls back to the plain absolute path when the parent does not exist.
#[must_use]
pub fn resolve_location(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => dunce::canonicalize(parent)
            .map_or_else(|_| dunce::simplified(&absolute).to_path_buf(), |p| p.join(name)),
        _ => dunce::simplified(&absolute).to_path_buf(),
    }
}

/// Whether `a` and `b` name the same filesystem location.
///
/// Comparison is case-insensitive on Windows, where the filesystem is.
#[must_use]
pub fn same_location(a: &Path, b: &Path) -> bool {
    let (a, b) = (resolve_location(a), resolve_location(b));
    if cfg!(windows) {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    } else {
        a == b
    }
}

/// Whether `path` is `dir` itself or lies somewhere beneath it.
///
/// Both sides go through [`resolve_location`]; the comparison is per path
/// component and case-insensitive on Windows.
#[must_use]
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let (path, dir) = (resolve_location(path), resolve_location(dir));
    if cfg!(windows) {
        let lower = |p: &Path| PathBuf::from(p.to_string_lossy().to_lowercase());
        lower(&path).starts_with(lower(&dir))
    } else {
        path.starts_with(&dir)
    }
}

/// Read the symlink at `link` and resolve its destination to an absolute path.
///
/// Relative destinations are interpreted against the link's parent directory.
/// Returns `None` if `link` is not a symlink.
#[must_use]
pub fn link_destination(link: &Path) -> Option<PathBuf> {
    let dest = std::fs::read_link(link).ok()?;
    let dest = dunce::simplified(&dest).to_path_buf();
    if dest.is_absolute() {
        Some(dest)
    } else {
        Some(link.parent().map_or_else(|| dest.clone(), |p| p.join(&dest)))
    }
}

/// Compute a free backup path `<path>.bak_<YYYYMMDD_HHmmss>` for `path`.
///
/// When that name is taken a numeric suffix (`_1`, `_2`, …) is appended until
/// a free name is found.
#[must_use]
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "backup".to_string(), |n| n.to_string_lossy().into_owned());
    let base = format!("{name}.bak_{}", now.format("%Y%m%d_%H%M%S"));
    let mut candidate = path.with_file_name(&base);
    let mut n = 1u32;
    while candidate.symlink_metadata().is_ok() {
        candidate = path.with_file_name(format!("{base}_{n}"));
        n += 1;
    }
    candidate
}

/// Move the file or directory at `path` to a fresh timestamped backup name.
///
/// # Errors
///
/// Returns [`ResourceError::BackupFailed`] if the rename fails.
pub fn backup(path: &Path) -> Result<PathBuf, ResourceError> {
    let dest = backup_path(path, Local::now());
    std::fs::rename(path, &dest).map_err(|e| ResourceError::BackupFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(dest)
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`). Rust's `symlink_metadata().is_dir()` returns `false` for
/// symlinks, so the raw `FILE_ATTRIBUTE_DIRECTORY` flag is checked instead.
/// If `remove_dir` still fails with OS error 5 (access denied), this falls
/// back to `cmd /c rmdir` which runs in a separate process.
///
/// # Errors
///
/// Returns an error if the link cannot be removed.
pub fn remove_link(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        match std::fs::remove_dir(path) {
            Ok(()) => {}
            #[cfg(windows)]
            Err(e) if e.raw_os_error() == Some(5) => {
                remove_dir_fallback(path)?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("removing link: {}", path.display()));
            }
        }
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing link: {}", path.display()))?;
    }
    Ok(())
}

/// Check if metadata represents a directory-like entry.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir() && !meta.is_symlink()
    }
}

/// Fallback directory removal on Windows using `cmd /c rmdir`.
///
/// A separate process holds none of our handles, which resolves most
/// "Access is denied" errors on directory links.
#[cfg(windows)]
fn remove_dir_fallback(path: &Path) -> Result<()> {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg("rmdir")
        .arg("/q")
        .arg(path)
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .context("failed to run rmdir")?;
    if !output.status.success() {
        anyhow::bail!(
            "remove directory link '{}': {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn ensure_parent_dir_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.txt");
        ensure_parent_dir(&nested).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }

    #[test]
    fn backup_path_uses_timestamp_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("profile.ps1");
        let backup = backup_path(&target, fixed_time());
        assert_eq!(
            backup.file_name().unwrap().to_string_lossy(),
            "profile.ps1.bak_20240309_140507"
        );
    }

    #[test]
    fn backup_path_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("settings.json");
        std::fs::write(dir.path().join("settings.json.bak_20240309_140507"), "old").unwrap();
        std::fs::write(dir.path().join("settings.json.bak_20240309_140507_1"), "old").unwrap();
        let backup = backup_path(&target, fixed_time());
        assert_eq!(
            backup.file_name().unwrap().to_string_lossy(),
            "settings.json.bak_20240309_140507_2"
        );
    }

    #[test]
    fn backup_moves_file_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("profile.ps1");
        std::fs::write(&target, "X").unwrap();
        let dest = backup(&target).unwrap();
        assert!(!target.exists());
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "X");
    }

    #[test]
    fn backup_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = backup(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ResourceError::BackupFailed { .. }));
    }

    #[test]
    fn same_location_collapses_dot_segments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let a = dir.path().join("sub").join("..").join("file");
        let b = dir.path().join("file");
        assert!(same_location(&a, &b));
        assert!(!same_location(&b, &dir.path().join("other")));
    }

    #[cfg(unix)]
    #[test]
    fn same_location_does_not_follow_final_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let link = dir.path().join("link");
        std::fs::write(&source, "x").unwrap();
        std::os::unix::fs::symlink(&source, &link).unwrap();
        assert!(!same_location(&source, &link));
    }

    #[test]
    fn is_within_matches_whole_components_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("PowerShell/dotfiles")).unwrap();
        let nested = dir.path().join("PowerShell/dotfiles/profile.ps1");
        assert!(is_within(&nested, &dir.path().join("PowerShell")));
        assert!(is_within(&nested, &dir.path().join("PowerShell/../PowerShell")));
        assert!(!is_within(&nested, &dir.path().join("Power")));
        assert!(!is_within(&dir.path().join("PowerShell"), &nested));
    }

    #[cfg(unix)]
    #[test]
    fn link_destination_resolves_relative_links() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source"), "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("source", &link).unwrap();
        let dest = link_destination(&link).unwrap();
        assert!(same_location(&dest, &dir.path().join("source")));
    }

    #[test]
    fn link_destination_none_for_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(link_destination(&file).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn remove_link_removes_broken_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("/nonexistent/target", &link).unwrap();
        remove_link(&link).unwrap();
        assert!(link.symlink_metadata().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn remove_link_removes_directory_symlink_only() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("keep.txt"), "keep").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        remove_link(&link).unwrap();
        assert!(link.symlink_metadata().is_err());
        assert!(real.join("keep.txt").exists());
    }
}

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for link synchronization through the public resource API.

use std::path::Path;

use chrono::{Local, TimeZone};
use dotfiles_setup::resources::fs::backup_path;
use dotfiles_setup::resources::symlink::{LinkState, SymlinkResource};
use dotfiles_setup::resources::{Resource, ResourceChange};

fn link(dir: &Path) -> SymlinkResource {
    SymlinkResource::new(
        dir.join("repo/profile.ps1"),
        dir.join("home/profile.ps1"),
        "PowerShell profile",
    )
}

#[test]
fn backup_name_uses_local_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    let path = backup_path(&dir.path().join("profile.ps1"), now);
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "profile.ps1.bak_20240309_070501"
    );
}

#[test]
fn missing_source_leaves_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("home")).unwrap();
    std::fs::write(dir.path().join("home/profile.ps1"), "X").unwrap();
    let r = link(dir.path());

    assert_eq!(r.inspect(), LinkState::SourceMissing);
    assert!(matches!(r.apply().unwrap(), ResourceChange::Skipped { .. }));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("home/profile.ps1")).unwrap(),
        "X"
    );
}

#[cfg(unix)]
#[test]
fn existing_file_is_backed_up_then_linked() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("repo")).unwrap();
    std::fs::create_dir_all(dir.path().join("home")).unwrap();
    std::fs::write(dir.path().join("repo/profile.ps1"), "# profile").unwrap();
    std::fs::write(dir.path().join("home/profile.ps1"), "X").unwrap();
    let r = link(dir.path());

    let ResourceChange::BackedUp { backup } = r.apply().unwrap() else {
        panic!("expected the existing file to be backed up");
    };
    assert!(
        backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("profile.ps1.bak_")
    );
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "X");
    assert_eq!(
        std::fs::read_link(dir.path().join("home/profile.ps1")).unwrap(),
        dir.path().join("repo/profile.ps1")
    );

    assert_eq!(r.inspect(), LinkState::Linked);
    assert!(matches!(r.apply().unwrap(), ResourceChange::AlreadyCorrect));
    let backups = std::fs::read_dir(dir.path().join("home"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains(".bak_"))
        .count();
    assert_eq!(backups, 1);
}

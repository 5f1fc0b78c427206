//! Top-level commands and the setup they share.
pub mod install;
pub mod preflight;
pub mod status;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{Config, DEFAULT_MANIFEST};
use crate::error::PreconditionError;
use crate::logging::Log;
use crate::platform::Platform;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, root and home resolution, and manifest
/// loading so that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Resolved manifest.
    pub config: Config,
    /// The user's home directory.
    pub home: PathBuf,
}

impl CommandSetup {
    /// Detect the platform, resolve root and home, and load the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or home directory cannot be determined,
    /// or the manifest is missing or invalid.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let platform = Platform::detect();
        let root = resolve_root(global)?;
        let home = resolve_home(|key| std::env::var(key).ok())?;
        Self::load(global, log, platform, &root, home)
    }

    /// Load the manifest for an already-resolved platform, root and home.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or invalid.
    pub fn load(
        global: &GlobalOpts,
        log: &dyn Log,
        platform: Platform,
        root: &Path,
        home: PathBuf,
    ) -> Result<Self> {
        log.stage("Loading configuration");
        let path = manifest_path(global, root);
        log.debug(&format!("root: {}", root.display()));
        log.debug(&format!("manifest: {}", path.display()));

        let config = Config::load(&path, root, &home, &platform)?;
        log.info(&format!(
            "loaded {} tools, {} modules, {} directories, {} links",
            config.tools.len(),
            config.modules.len(),
            config.directories.len(),
            config.links.len()
        ));

        if !config.warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                config.warnings.len()
            ));
            for warning in &config.warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        Ok(Self {
            platform,
            config,
            home,
        })
    }
}

/// Manifest location: `--config`, else `<root>/conf/bootstrap.toml`.
#[must_use]
pub fn manifest_path(global: &GlobalOpts, root: &Path) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_MANIFEST))
}

/// Resolve the home directory from `USERPROFILE` or `HOME`.
///
/// # Errors
///
/// Returns [`PreconditionError::HomeUnknown`] if neither is set.
pub fn resolve_home(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, PreconditionError> {
    ["USERPROFILE", "HOME"]
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .ok_or(PreconditionError::HomeUnknown)
}

/// Resolve the dotfiles root directory from CLI arguments or auto-detection.
///
/// # Errors
///
/// Returns an error if the root directory cannot be determined.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Ok(root) = std::env::var("DOTFILES_ROOT") {
        return Ok(PathBuf::from(root));
    }

    // Binary built in place (target/release/) or installed to bin/
    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        for candidate in [parent.join("../.."), parent.join("..")] {
            if candidate.join(DEFAULT_MANIFEST).exists() {
                return dunce::canonicalize(&candidate)
                    .with_context(|| format!("resolving {}", candidate.display()));
            }
        }
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    if cwd.join(DEFAULT_MANIFEST).exists() {
        return Ok(cwd);
    }

    anyhow::bail!("cannot determine dotfiles root. Use --root or set DOTFILES_ROOT env var");
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::tasks::test_helpers::RecordingLog;

    #[test]
    fn resolve_root_uses_explicit_root() {
        let global = GlobalOpts {
            root: Some(PathBuf::from("/explicit/path")),
            ..GlobalOpts::default()
        };
        assert_eq!(
            resolve_root(&global).unwrap(),
            PathBuf::from("/explicit/path")
        );
    }

    #[test]
    fn manifest_path_defaults_under_root() {
        let global = GlobalOpts::default();
        assert_eq!(
            manifest_path(&global, Path::new("/dotfiles")),
            Path::new("/dotfiles").join(DEFAULT_MANIFEST)
        );
    }

    #[test]
    fn manifest_path_prefers_flag() {
        let global = GlobalOpts {
            config: Some(PathBuf::from("/elsewhere/setup.toml")),
            ..GlobalOpts::default()
        };
        assert_eq!(
            manifest_path(&global, Path::new("/dotfiles")),
            PathBuf::from("/elsewhere/setup.toml")
        );
    }

    #[test]
    fn resolve_home_prefers_userprofile() {
        let home = resolve_home(|key| match key {
            "USERPROFILE" => Some(r"C:\Users\dev".to_string()),
            "HOME" => Some("/home/dev".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(home, PathBuf::from(r"C:\Users\dev"));
    }

    #[test]
    fn resolve_home_ignores_empty_values() {
        let home = resolve_home(|key| match key {
            "USERPROFILE" => Some(String::new()),
            "HOME" => Some("/home/dev".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(home, PathBuf::from("/home/dev"));
    }

    #[test]
    fn resolve_home_fails_without_variables() {
        assert!(matches!(
            resolve_home(|_| None),
            Err(PreconditionError::HomeUnknown)
        ));
    }

    #[test]
    fn load_reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();
        let err = CommandSetup::load(
            &GlobalOpts::default(),
            &log,
            Platform::new(Os::Linux),
            dir.path(),
            PathBuf::from("/home/test"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("manifest not found"));
    }

    #[test]
    fn load_prints_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("conf")).unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_MANIFEST),
            "[[links]]\nsource = \"a\"\ntarget = \"~/x\"\n\n[[links]]\nsource = \"b\"\ntarget = \"~/x\"\n",
        )
        .unwrap();
        let log = RecordingLog::default();
        let setup = CommandSetup::load(
            &GlobalOpts::default(),
            &log,
            Platform::new(Os::Linux),
            dir.path(),
            PathBuf::from("/home/test"),
        )
        .unwrap();
        assert_eq!(setup.config.links.len(), 2);
        assert!(log.contains("[warn] found 1 configuration warning(s):"));
        assert!(log.contains("loaded 0 tools, 0 modules, 0 directories, 2 links"));
    }
}

//! Manifest loading: parse `conf/bootstrap.toml`, filter by platform and
//! resolve every path against the repository root and home directory.
pub mod expand;
pub mod manifest;
pub mod validation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::exec::RetryPolicy;
use crate::platform::Platform;

pub use manifest::Settings;
pub use validation::ValidationWarning;

/// Default manifest location relative to the repository root.
pub const DEFAULT_MANIFEST: &str = "conf/bootstrap.toml";

/// A tool to ensure, filtered for the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// Package-manager id.
    pub id: String,
    /// Executable probed on `PATH`.
    pub command: Option<String>,
}

/// A link to synchronize, with resolved absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// What the link points to.
    pub source: PathBuf,
    /// Where the link is created.
    pub target: PathBuf,
    /// Display label.
    pub label: String,
    /// Whether a missing source aborts the run.
    pub required: bool,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotfiles repository root.
    pub root: PathBuf,
    /// Run-wide settings.
    pub settings: Settings,
    /// Tools to ensure.
    pub tools: Vec<Tool>,
    /// PowerShell modules to ensure.
    pub modules: Vec<String>,
    /// Directories to ensure.
    pub directories: Vec<PathBuf>,
    /// Links to synchronize.
    pub links: Vec<LinkSpec>,
    /// Problems found while loading; reported but not fatal.
    pub warnings: Vec<ValidationWarning>,
}

impl Config {
    /// Load the manifest at `path` and resolve it for `platform`.
    ///
    /// Entries tagged for another OS are dropped. Link sources resolve
    /// against `root`; targets and directories expand `~` to `home` and
    /// resolve against `home` when relative.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the manifest is missing, unreadable,
    /// malformed, or references an undefined environment variable.
    pub fn load(
        path: &Path,
        root: &Path,
        home: &Path,
        platform: &Platform,
    ) -> Result<Self, ConfigError> {
        let manifest = manifest::load(path)?;
        Self::resolve(&manifest, root, home, platform)
    }

    /// Resolve an already-parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Expand`] if a path references an undefined
    /// environment variable.
    pub fn resolve(
        manifest: &manifest::Manifest,
        root: &Path,
        home: &Path,
        platform: &Platform,
    ) -> Result<Self, ConfigError> {
        let tools = manifest
            .tools
            .iter()
            .filter(|t| platform.accepts(t.os.as_deref()))
            .map(|t| Tool {
                id: t.id.clone(),
                command: t.command.clone(),
            })
            .collect();

        let modules = manifest
            .modules
            .iter()
            .filter(|m| platform.accepts(m.os.as_deref()))
            .map(|m| m.name.clone())
            .collect();

        let directories = manifest
            .directories
            .iter()
            .filter(|d| platform.accepts(d.os.as_deref()))
            .map(|d| expand::expand_path(&d.path, home, home))
            .collect::<Result<Vec<_>, _>>()?;

        let links = manifest
            .links
            .iter()
            .filter(|l| platform.accepts(l.os.as_deref()))
            .map(|l| {
                Ok(LinkSpec {
                    source: expand::expand_path(&l.source, home, root)?,
                    target: expand::expand_path(&l.target, home, home)?,
                    label: l.label.clone().unwrap_or_else(|| l.source.clone()),
                    required: l.required,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let warnings = validation::validate_all(manifest, &links, platform);

        Ok(Self {
            root: root.to_path_buf(),
            settings: manifest.settings,
            tools,
            modules,
            directories,
            links,
            warnings,
        })
    }

    /// Retry policy for transient external steps.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.settings.retries,
            Duration::from_secs(self.settings.retry_delay_secs),
        )
    }

    /// Links marked `required` whose source does not exist.
    #[must_use]
    pub fn missing_required_sources(&self) -> Vec<&LinkSpec> {
        self.links
            .iter()
            .filter(|l| l.required && !l.source.exists())
            .collect()
    }
}

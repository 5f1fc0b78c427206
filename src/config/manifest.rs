//! Raw TOML manifest as written in `conf/bootstrap.toml`.
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Default number of attempts for transient external steps.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default pause between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Top-level manifest document.
///
/// Every table is optional; an absent table deserializes to an empty list.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Run-wide settings.
    pub settings: Settings,
    /// Tools installed through the package manager.
    pub tools: Vec<ToolEntry>,
    /// PowerShell modules.
    pub modules: Vec<ModuleEntry>,
    /// Directories that must exist.
    pub directories: Vec<DirectoryEntry>,
    /// Links from the repository into the home directory.
    pub links: Vec<LinkEntry>,
}

/// `[settings]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Attempts for transient external steps (at least one is always made).
    pub retries: u32,
    /// Pause between attempts, in seconds.
    pub retry_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

/// `[[tools]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolEntry {
    /// Package-manager id.
    pub id: String,
    /// Executable probed on `PATH` before querying the package manager.
    #[serde(default)]
    pub command: Option<String>,
    /// Platform filter.
    #[serde(default)]
    pub os: Option<String>,
}

/// `[[modules]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    /// Module name.
    pub name: String,
    /// Platform filter.
    #[serde(default)]
    pub os: Option<String>,
}

/// `[[directories]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryEntry {
    /// Directory path; `~` and `$VAR` are expanded.
    pub path: String,
    /// Platform filter.
    #[serde(default)]
    pub os: Option<String>,
}

/// `[[links]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    /// Source path, relative to the repository root unless absolute.
    pub source: String,
    /// Link location; `~` and `$VAR` are expanded.
    pub target: String,
    /// Display label; defaults to `source`.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether a missing source aborts the run.
    #[serde(default)]
    pub required: bool,
    /// Platform filter.
    #[serde(default)]
    pub os: Option<String>,
}

/// Read and parse the manifest at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if the file does not exist,
/// [`ConfigError::Io`] if it cannot be read, and [`ConfigError::Parse`] if it
/// is not valid TOML or does not match the schema.
pub fn load(path: &Path) -> Result<Manifest, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse manifest text.
///
/// # Errors
///
/// Returns the TOML error if the text is malformed or has unknown keys.
pub fn parse(content: &str) -> Result<Manifest, toml::de::Error> {
    toml::from_str(content)
}

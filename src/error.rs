//! Domain-specific error types for the setup engine.
//!
//! Internal modules return typed errors (e.g. [`PreconditionError`],
//! [`ConfigError`]) while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! SetupError
//! ├── Precondition(PreconditionError): fatal, raised before any mutation
//! ├── Config(ConfigError):             manifest loading and parsing
//! └── Resource(ResourceError):         per-item failures (links, tools, …)
//! ```
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the setup engine.
#[derive(Error, Debug)]
pub enum SetupError {
    /// A precondition failed; nothing has been changed.
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// The manifest could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single resource could not be brought into the desired state.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

/// Fatal conditions detected before the run mutates anything.
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// Symlink creation requires elevation (or Developer Mode) on this platform.
    #[error(
        "administrator privileges are required to create symbolic links; \
         re-run from an elevated shell or enable Developer Mode"
    )]
    NotElevated,

    /// A link marked `required` has no source file.
    #[error("required source for '{label}' is missing: {}", path.display())]
    MissingRequiredSource {
        /// Display label of the link entry.
        label: String,
        /// Resolved source path that does not exist.
        path: PathBuf,
    },

    /// The user's home directory could not be determined.
    #[error("cannot determine the home directory (set HOME or USERPROFILE)")]
    HomeUnknown,

    /// The user declined the confirmation prompt.
    #[error("aborted by user")]
    Declined,
}

/// Errors that arise from loading the manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest file does not exist.
    #[error("manifest not found: {}", path.display())]
    NotFound {
        /// Expected manifest location.
        path: PathBuf,
    },

    /// An I/O error occurred while reading the manifest.
    #[error("IO error reading manifest {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or does not match the schema.
    #[error("invalid manifest {}: {source}", path.display())]
    Parse {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A path in the manifest references an undefined variable.
    #[error("cannot expand '{input}': {message}")]
    Expand {
        /// The raw path as written in the manifest.
        input: String,
        /// Reason the expansion failed.
        message: String,
    },
}

/// Errors that arise from resource checks and apply operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Creating the symbolic link failed.
    #[error("cannot link {} -> {}: {reason}", target.display(), source_path.display())]
    LinkFailed {
        /// Link location.
        target: PathBuf,
        /// Link destination.
        source_path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Moving a conflicting entry out of the way failed.
    #[error("cannot back up {}: {reason}", path.display())]
    BackupFailed {
        /// Path that could not be renamed.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// A package or module install failed after all retries.
    #[error("installing '{name}' failed: {reason}")]
    InstallFailed {
        /// Package id or module name.
        name: String,
        /// Underlying failure.
        reason: String,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_elevated_mentions_developer_mode() {
        let e = PreconditionError::NotElevated;
        assert!(e.to_string().contains("Developer Mode"));
    }

    #[test]
    fn missing_required_source_display() {
        let e = PreconditionError::MissingRequiredSource {
            label: "PowerShell profile".to_string(),
            path: PathBuf::from("/repo/profile.ps1"),
        };
        assert_eq!(
            e.to_string(),
            "required source for 'PowerShell profile' is missing: /repo/profile.ps1"
        );
    }

    #[test]
    fn config_not_found_display() {
        let e = ConfigError::NotFound {
            path: PathBuf::from("/repo/conf/bootstrap.toml"),
        };
        assert_eq!(e.to_string(), "manifest not found: /repo/conf/bootstrap.toml");
    }

    #[test]
    fn config_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: PathBuf::from("/repo/conf/bootstrap.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("IO error reading manifest"));
    }

    #[test]
    fn link_failed_display() {
        let e = ResourceError::LinkFailed {
            target: PathBuf::from("/home/u/.bashrc"),
            source_path: PathBuf::from("/repo/bashrc"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cannot link /home/u/.bashrc -> /repo/bashrc: permission denied"
        );
    }

    #[test]
    fn install_failed_display() {
        let e = ResourceError::InstallFailed {
            name: "Git.Git".to_string(),
            reason: "exit 1".to_string(),
        };
        assert_eq!(e.to_string(), "installing 'Git.Git' failed: exit 1");
    }

    #[test]
    fn setup_error_wraps_precondition() {
        let e: SetupError = PreconditionError::Declined.into();
        assert_eq!(e.to_string(), "Precondition failed: aborted by user");
    }

    #[test]
    fn setup_error_wraps_resource() {
        let e: SetupError = ResourceError::BackupFailed {
            path: PathBuf::from("/home/u/.bashrc"),
            reason: "access denied".to_string(),
        }
        .into();
        assert!(e.to_string().starts_with("Resource error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<SetupError>();
        assert_send_sync::<PreconditionError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ResourceError>();
    }

    #[test]
    fn precondition_error_converts_to_anyhow() {
        let e = PreconditionError::NotElevated;
        let err: anyhow::Error = e.into();
        assert!(err.downcast_ref::<PreconditionError>().is_some());
    }
}

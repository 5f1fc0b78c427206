//! `~` and environment-variable expansion for manifest paths.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Expand `~`, `$VAR` and `${VAR}` in `raw`.
///
/// `~` resolves to `home` rather than the ambient process environment, so a
/// run context can point it anywhere. Relative results are joined onto
/// `base`.
///
/// # Errors
///
/// Returns [`ConfigError::Expand`] if a referenced variable is not set.
pub fn expand_path(raw: &str, home: &Path, base: &Path) -> Result<PathBuf, ConfigError> {
    let home_str = home.to_string_lossy();
    let expanded = shellexpand::full_with_context(
        raw,
        || Some(&*home_str),
        |var: &str| std::env::var(var).map(Some),
    )
    .map_err(|e| ConfigError::Expand {
        input: raw.to_string(),
        message: e.to_string(),
    })?;
    let path = PathBuf::from(expanded.into_owned());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base.join(path))
    }
}

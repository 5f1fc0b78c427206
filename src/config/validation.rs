//! Non-fatal manifest checks, reported before a run starts.
use std::collections::HashMap;
use std::path::Path;

use super::LinkSpec;
use super::manifest::Manifest;
use crate::platform::{Os, Platform};

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The manifest table (e.g. `"links"`, `"tools"`).
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.source, self.item, self.message)
    }
}

/// Trait for manifest validators.
pub trait ConfigValidator {
    /// Validate and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;
}

/// Checks `[[links]]` entries.
#[derive(Debug)]
pub struct LinkValidator<'a> {
    manifest: &'a Manifest,
    resolved: &'a [LinkSpec],
    platform: &'a Platform,
}

impl<'a> LinkValidator<'a> {
    /// Create a validator over raw and resolved links.
    #[must_use]
    pub const fn new(manifest: &'a Manifest, resolved: &'a [LinkSpec], platform: &'a Platform) -> Self {
        Self {
            manifest,
            resolved,
            platform,
        }
    }
}

impl ConfigValidator for LinkValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for link in &self.manifest.links {
            if link.source.trim().is_empty() || link.target.trim().is_empty() {
                warnings.push(ValidationWarning::new(
                    "links",
                    &link.source,
                    "source and target must not be empty",
                ));
            }
            if Path::new(&link.source).is_absolute() {
                warnings.push(ValidationWarning::new(
                    "links",
                    &link.source,
                    "source should be relative to the repository root",
                ));
            }
            if let Some(os) = &link.os
                && Os::from_tag(os).is_none()
            {
                warnings.push(ValidationWarning::new(
                    "links",
                    &link.source,
                    format!("unknown os '{os}'; entry never applies"),
                ));
            }
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for link in self.resolved {
            let key = target_key(&link.target, self.platform);
            if let Some(first) = seen.get(&key) {
                warnings.push(ValidationWarning::new(
                    "links",
                    &link.label,
                    format!(
                        "target {} is also claimed by '{first}'",
                        link.target.display()
                    ),
                ));
            } else {
                seen.insert(key, &link.label);
            }
        }

        warnings
    }
}

/// Checks `[[tools]]`, `[[modules]]` and `[[directories]]` entries.
#[derive(Debug)]
pub struct EnsureValidator<'a> {
    manifest: &'a Manifest,
}

impl<'a> EnsureValidator<'a> {
    /// Create a validator over the ensure tables.
    #[must_use]
    pub const fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }
}

impl ConfigValidator for EnsureValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let tags = self
            .manifest
            .tools
            .iter()
            .map(|t| ("tools", t.id.as_str(), t.os.as_deref()))
            .chain(
                self.manifest
                    .modules
                    .iter()
                    .map(|m| ("modules", m.name.as_str(), m.os.as_deref())),
            )
            .chain(
                self.manifest
                    .directories
                    .iter()
                    .map(|d| ("directories", d.path.as_str(), d.os.as_deref())),
            );

        for (table, item, os) in tags {
            if item.trim().is_empty() {
                warnings.push(ValidationWarning::new(table, item, "entry is empty"));
            }
            if let Some(os) = os
                && Os::from_tag(os).is_none()
            {
                warnings.push(ValidationWarning::new(
                    table,
                    item,
                    format!("unknown os '{os}'; entry never applies"),
                ));
            }
        }
        warnings
    }
}

/// Normalized comparison key for a link target.
fn target_key(target: &Path, platform: &Platform) -> String {
    let s = target.to_string_lossy();
    if platform.is_windows() {
        s.to_lowercase().replace('/', "\\")
    } else {
        s.into_owned()
    }
}

/// Run every validator and return all warnings.
#[must_use]
pub fn validate_all(
    manifest: &Manifest,
    links: &[LinkSpec],
    platform: &Platform,
) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 2] = [
        &LinkValidator::new(manifest, links, platform),
        &EnsureValidator::new(manifest),
    ];
    validators.iter().flat_map(|v| v.validate()).collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::manifest::parse;

    fn warnings(text: &str, os: Os) -> Vec<ValidationWarning> {
        let manifest = parse(text).unwrap();
        Config::resolve(
            &manifest,
            Path::new("/repo"),
            Path::new("/home/u"),
            &Platform::new(os),
        )
        .unwrap()
        .warnings
    }

    #[test]
    fn clean_manifest_has_no_warnings() {
        let w = warnings(
            r#"
            [[tools]]
            id = "Git.Git"
            [[links]]
            source = "a"
            target = "~/a"
            "#,
            Os::Linux,
        );
        assert!(w.is_empty(), "unexpected warnings: {w:?}");
    }

    #[test]
    fn duplicate_targets_are_reported() {
        let w = warnings(
            r#"
            [[links]]
            source = "a"
            target = "~/same"
            [[links]]
            source = "b"
            target = "~/same"
            "#,
            Os::Linux,
        );
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].item, "b");
        assert!(w[0].message.contains("'a'"));
    }

    #[test]
    fn duplicate_targets_ignore_case_on_windows() {
        let w = warnings(
            r#"
            [[links]]
            source = "a"
            target = "~/Profile.ps1"
            [[links]]
            source = "b"
            target = "~/profile.ps1"
            "#,
            Os::Windows,
        );
        assert_eq!(w.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn absolute_source_is_reported() {
        let w = warnings("[[links]]\nsource = \"/etc/a\"\ntarget = \"~/a\"\n", Os::Linux);
        assert_eq!(w.len(), 1);
        assert!(w[0].message.contains("relative"));
    }

    #[test]
    fn empty_tool_id_and_unknown_os_are_reported() {
        let w = warnings(
            r#"
            [[tools]]
            id = ""
            [[modules]]
            name = "posh-git"
            os = "amiga"
            "#,
            Os::Linux,
        );
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].source, "tools");
        assert!(w[1].message.contains("amiga"));
    }

    #[test]
    fn warning_display() {
        let w = ValidationWarning::new("links", "a", "oops");
        assert_eq!(w.to_string(), "links: a: oops");
    }
}

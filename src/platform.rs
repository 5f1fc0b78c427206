//! Host platform detection.
use std::fmt;

use crate::exec::Executor;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other non-macOS Unix systems.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

impl Os {
    /// Parse a manifest `os` filter value (`windows`, `linux`, `macos`).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "macos" | "darwin" => Some(Self::MacOs),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Create a platform with an explicit OS (for testing).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether the platform is Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Whether an entry tagged with `os` applies to this platform.
    ///
    /// Entries without a tag apply everywhere; unknown tags never match.
    #[must_use]
    pub fn accepts(&self, os: Option<&str>) -> bool {
        os.is_none_or(|tag| Os::from_tag(tag) == Some(self.os))
    }

    /// Whether the current process runs with administrator rights.
    ///
    /// On Windows this probes `net session`, which only succeeds from an
    /// elevated shell. Other platforms need no elevation for symlinks and
    /// always report `true`.
    #[must_use]
    pub fn is_elevated(&self, executor: &dyn Executor) -> bool {
        if !self.is_windows() {
            return true;
        }
        executor
            .run_unchecked("net", &["session"])
            .is_ok_and(|r| r.success)
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Linux
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn detect_matches_compile_target() {
        let p = Platform::detect();
        assert_eq!(p.is_windows(), cfg!(target_os = "windows"));
    }

    #[test]
    fn from_tag_is_case_insensitive() {
        assert_eq!(Os::from_tag("Windows"), Some(Os::Windows));
        assert_eq!(Os::from_tag(" linux "), Some(Os::Linux));
        assert_eq!(Os::from_tag("darwin"), Some(Os::MacOs));
        assert_eq!(Os::from_tag("beos"), None);
    }

    #[test]
    fn accepts_untagged_entries() {
        let p = Platform::new(Os::Linux);
        assert!(p.accepts(None));
    }

    #[test]
    fn accepts_matching_tag_only() {
        let p = Platform::new(Os::Windows);
        assert!(p.accepts(Some("windows")));
        assert!(!p.accepts(Some("linux")));
        assert!(!p.accepts(Some("plan9")));
    }

    #[test]
    fn non_windows_is_always_elevated() {
        let executor = MockExecutor::with_responses(vec![]);
        assert!(Platform::new(Os::Linux).is_elevated(&executor));
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn windows_elevation_follows_net_session() {
        let elevated = MockExecutor::with_responses(vec![(true, String::new())]);
        let plain = MockExecutor::with_responses(vec![(false, "Access is denied.".to_string())]);
        let windows = Platform::new(Os::Windows);
        assert!(windows.is_elevated(&elevated));
        assert!(!windows.is_elevated(&plain));
        assert_eq!(elevated.calls(), vec!["net session"]);
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Linux.to_string(), "linux");
        assert_eq!(Os::MacOs.to_string(), "macos");
        assert_eq!(Os::Windows.to_string(), "windows");
    }
}

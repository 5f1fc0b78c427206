//! Windows Developer Mode probe.
use anyhow::Result;

/// Registry key path for Windows Developer Mode (display only).
const DEVELOPER_MODE_KEY: &str = r"HKLM:\SOFTWARE\Microsoft\Windows\CurrentVersion\AppModelUnlock";

/// Registry subkey path for native Windows registry access.
#[cfg(windows)]
const DEVELOPER_MODE_SUBKEY: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\AppModelUnlock";

/// Registry value name for the developer mode flag.
const DEVELOPER_MODE_VALUE: &str = "AllowDevelopmentWithoutDevLicense";

/// Read-only view of the Developer Mode flag.
///
/// Developer Mode allows symlink creation without administrator privileges,
/// so the privilege preflight accepts it in place of elevation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeveloperMode;

impl DeveloperMode {
    /// Registry location of the flag, for log messages.
    #[must_use]
    pub fn description(self) -> String {
        format!("{DEVELOPER_MODE_KEY}\\{DEVELOPER_MODE_VALUE}")
    }

    /// Whether Developer Mode is switched on.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read for a reason other
    /// than the key or value being absent.
    #[cfg(windows)]
    pub fn is_enabled(self) -> Result<bool> {
        use winreg::RegKey;
        use winreg::enums::HKEY_LOCAL_MACHINE;
        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        match hklm.open_subkey(DEVELOPER_MODE_SUBKEY) {
            Ok(key) => match key.get_value::<u32, _>(DEVELOPER_MODE_VALUE) {
                Ok(v) => Ok(v == 1),
                Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            },
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether Developer Mode is switched on. Always `false` off Windows.
    ///
    /// # Errors
    ///
    /// Never fails off Windows.
    #[cfg(not(windows))]
    pub const fn is_enabled(self) -> Result<bool> {
        Ok(false)
    }
}

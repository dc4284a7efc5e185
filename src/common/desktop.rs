use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Environment variable naming the running desktop session
pub const SESSION_VARIABLE: &str = "XDG_CURRENT_DESKTOP";

/// Desktop environments with native tooling support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesktopEnvironment {
    Gnome,
    Kde,
    Xfce,
    /// Missing or unsupported session; nothing destructive may run
    Unknown,
}

impl DesktopEnvironment {
    /// Detect the current desktop from `XDG_CURRENT_DESKTOP`
    pub fn detect() -> Self {
        match env::var(SESSION_VARIABLE) {
            Ok(value) => Self::from_session_value(&value),
            Err(_) => DesktopEnvironment::Unknown,
        }
    }

    /// Normalize a session value such as `KDE`, `ubuntu:GNOME` or `XFCE`
    pub fn from_session_value(value: &str) -> Self {
        let value = value.trim().to_lowercase();

        if value.contains("gnome") {
            DesktopEnvironment::Gnome
        } else if value.contains("kde") || value.contains("plasma") {
            DesktopEnvironment::Kde
        } else if value.contains("xfce") {
            DesktopEnvironment::Xfce
        } else {
            DesktopEnvironment::Unknown
        }
    }

    pub fn is_supported(self) -> bool {
        self != DesktopEnvironment::Unknown
    }

    pub fn id(self) -> &'static str {
        match self {
            DesktopEnvironment::Gnome => "gnome",
            DesktopEnvironment::Kde => "kde",
            DesktopEnvironment::Xfce => "xfce",
            DesktopEnvironment::Unknown => "unknown",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DesktopEnvironment::Gnome => "GNOME",
            DesktopEnvironment::Kde => "KDE Plasma",
            DesktopEnvironment::Xfce => "XFCE",
            DesktopEnvironment::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_session_values() {
        assert_eq!(
            DesktopEnvironment::from_session_value("GNOME"),
            DesktopEnvironment::Gnome
        );
        assert_eq!(
            DesktopEnvironment::from_session_value("ubuntu:GNOME"),
            DesktopEnvironment::Gnome
        );
        assert_eq!(
            DesktopEnvironment::from_session_value("KDE"),
            DesktopEnvironment::Kde
        );
        assert_eq!(
            DesktopEnvironment::from_session_value("XFCE"),
            DesktopEnvironment::Xfce
        );
        assert_eq!(
            DesktopEnvironment::from_session_value("X-Cinnamon"),
            DesktopEnvironment::Unknown
        );
        assert_eq!(
            DesktopEnvironment::from_session_value(""),
            DesktopEnvironment::Unknown
        );
    }

    #[test]
    fn test_supported() {
        assert!(DesktopEnvironment::Kde.is_supported());
        assert!(!DesktopEnvironment::Unknown.is_supported());
        assert_eq!(DesktopEnvironment::Xfce.to_string(), "xfce");
    }

    #[test]
    #[serial]
    fn test_detect_reads_session_variable() {
        let previous = env::var(SESSION_VARIABLE).ok();

        unsafe { env::set_var(SESSION_VARIABLE, "KDE") };
        assert_eq!(DesktopEnvironment::detect(), DesktopEnvironment::Kde);

        unsafe { env::remove_var(SESSION_VARIABLE) };
        assert_eq!(DesktopEnvironment::detect(), DesktopEnvironment::Unknown);

        if let Some(value) = previous {
            unsafe { env::set_var(SESSION_VARIABLE, value) };
        }
    }
}

//! Theme state reading for the supported desktops
//!
//! KDE is read from kdeglobals on disk; GNOME and XFCE are queried through
//! their settings tools. Query failures degrade to an empty name.

pub mod commands;
pub mod kdeglobals;

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::common::DesktopEnvironment;
use crate::ui::prelude::*;

const DARK_MARKERS: &[&str] = &["dark", "breezedark", "qogirdark", "prefer-dark"];

/// Whether a theme name denotes a dark variant
pub fn is_dark(theme: &str) -> bool {
    let lower = theme.to_lowercase();
    DARK_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Which theme family is installed, deciding how a toggle is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeFlavor {
    /// Upstream desktop theme (Breeze, GNOME default, Adwaita)
    Stock,
    /// Distribution theme (Qogir, Orchis shell theme)
    Themed,
}

#[derive(Debug, Clone)]
pub struct ThemeReader {
    kde_candidates: Vec<PathBuf>,
}

impl ThemeReader {
    pub fn new(kde_candidates: Vec<PathBuf>) -> Self {
        Self { kde_candidates }
    }

    pub fn current_theme(&self, desktop: DesktopEnvironment) -> String {
        let theme = match desktop {
            DesktopEnvironment::Kde => kdeglobals::current_theme(&self.kde_candidates),
            DesktopEnvironment::Gnome => query(
                "gsettings",
                &["get", "org.gnome.desktop.interface", "color-scheme"],
            ),
            DesktopEnvironment::Xfce => query(
                "xfconf-query",
                &["-c", "xsettings", "-p", "/Net/ThemeName", "-v"],
            ),
            DesktopEnvironment::Unknown => String::new(),
        };

        emit(
            Level::Debug,
            "theme.current",
            &format!("Current theme {:?} on {}", theme, desktop),
            None,
        );
        theme
    }

    pub fn flavor(&self, desktop: DesktopEnvironment) -> ThemeFlavor {
        let themed = match desktop {
            DesktopEnvironment::Kde => !self.current_theme(desktop).contains("org.kde.breeze"),
            DesktopEnvironment::Gnome => query(
                "gsettings",
                &["get", "org.gnome.shell.extensions.user-theme", "name"],
            )
            .contains("Orchis"),
            DesktopEnvironment::Xfce => self.current_theme(desktop).contains("Qogir"),
            DesktopEnvironment::Unknown => false,
        };

        if themed {
            ThemeFlavor::Themed
        } else {
            ThemeFlavor::Stock
        }
    }
}

/// Run a settings query and return its cleaned stdout, or "" on failure
fn query(program: &str, args: &[&str]) -> String {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            clean_query_output(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            emit(
                Level::Warn,
                "theme.query_failed",
                &format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                None,
            );
            String::new()
        }
        Err(err) => {
            emit(
                Level::Warn,
                "theme.query_failed",
                &format!("Failed to run {}: {}", program, err),
                None,
            );
            String::new()
        }
    }
}

/// Strip whitespace and the quotes gsettings wraps strings in
pub fn clean_query_output(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_dark() {
        assert!(is_dark("org.kde.breezedark.desktop"));
        assert!(!is_dark("Adwaita"));
        assert!(is_dark("prefer-dark"));
        assert!(is_dark("Qogir-Dark"));
        assert!(is_dark("Qogirdark"));
        assert!(!is_dark("prefer-light"));
        assert!(!is_dark(""));
    }

    #[test]
    fn test_clean_query_output() {
        assert_eq!(clean_query_output("'prefer-dark'\n"), "prefer-dark");
        assert_eq!(clean_query_output("  Qogir-Light \n"), "Qogir-Light");
        assert_eq!(clean_query_output("\"Orchis-Light\""), "Orchis-Light");
    }

    #[test]
    fn test_unknown_desktop_has_no_theme() {
        let reader = ThemeReader::new(Vec::new());
        assert_eq!(reader.current_theme(DesktopEnvironment::Unknown), "");
        assert_eq!(reader.flavor(DesktopEnvironment::Unknown), ThemeFlavor::Stock);
    }

    #[test]
    fn test_kde_flavor_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let stock = dir.path().join("stock");
        let themed = dir.path().join("themed");
        std::fs::write(&stock, "[KDE]\nLookAndFeelPackage=org.kde.breezedark.desktop\n").unwrap();
        std::fs::write(&themed, "[General]\nColorScheme=Qogirdark\n").unwrap();

        let reader = ThemeReader::new(vec![stock]);
        assert_eq!(reader.flavor(DesktopEnvironment::Kde), ThemeFlavor::Stock);

        let reader = ThemeReader::new(vec![themed]);
        assert_eq!(reader.flavor(DesktopEnvironment::Kde), ThemeFlavor::Themed);
    }

    #[test]
    fn test_kde_flavor_with_blank_package_is_stock() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("kdeglobals");
        std::fs::write(&blank, "[KDE]\nLookAndFeelPackage=\n").unwrap();

        let reader = ThemeReader::new(vec![blank]);
        assert_eq!(
            reader.current_theme(DesktopEnvironment::Kde),
            kdeglobals::DEFAULT_KDE_THEME
        );
        assert_eq!(reader.flavor(DesktopEnvironment::Kde), ThemeFlavor::Stock);
    }
}

//! Minimal kdeglobals reader
//!
//! Only what is needed to find the active look-and-feel package or color
//! scheme. Not a general INI parser.

use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_KDE_THEME: &str = "org.kde.breeze.desktop";
pub const BREEZE_LIGHT: &str = "org.kde.breeze.desktop";
pub const BREEZE_DARK: &str = "org.kde.breezedark.desktop";

const KDE_SECTION: &str = "[KDE]";
const LOOK_AND_FEEL_KEY: &str = "LookAndFeelPackage";
const GENERAL_SECTION: &str = "[General]";
const COLOR_SCHEME_KEY: &str = "ColorScheme";

/// Find `key` inside `section` (given with brackets, e.g. `[KDE]`).
///
/// Scanning stops at the first header after the target section.
pub fn find_key(content: &str, section: &str, key: &str) -> Option<String> {
    let prefix = format!("{}=", key);
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line == section {
            in_section = true;
            continue;
        }

        if !in_section {
            continue;
        }

        if line.starts_with('[') {
            break;
        }

        if let Some(value) = line.strip_prefix(&prefix) {
            let value = value.trim();
            // An empty value means the key is unset
            return (!value.is_empty()).then(|| value.to_string());
        }
    }

    None
}

/// Normalize short Breeze names and `.colors` paths to theme identifiers
pub fn normalize_scheme(value: &str) -> String {
    match value {
        BREEZE_LIGHT | BREEZE_DARK => value.to_string(),
        "breeze" => BREEZE_LIGHT.to_string(),
        "breezedark" => BREEZE_DARK.to_string(),
        _ => {
            let path = Path::new(value);
            if path.extension().is_some_and(|ext| ext == "colors") {
                if let Some(stem) = path.file_stem() {
                    return stem.to_string_lossy().into_owned();
                }
            }
            value.to_string()
        }
    }
}

fn is_stock_breeze(value: &str) -> bool {
    value == BREEZE_LIGHT || value == BREEZE_DARK
}

/// Resolve the theme from the contents of a single kdeglobals file
pub fn theme_from_content(content: &str) -> Option<String> {
    let general = find_key(content, GENERAL_SECTION, COLOR_SCHEME_KEY).map(|v| normalize_scheme(&v));

    match find_key(content, KDE_SECTION, LOOK_AND_FEEL_KEY).map(|v| normalize_scheme(&v)) {
        Some(package) if is_stock_breeze(&package) => Some(package),
        Some(package) => general.or(Some(package)),
        None => general,
    }
}

/// Scan the candidate files in order; the first one yielding a value wins
pub fn current_theme(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .find_map(|content| theme_from_content(&content))
        .unwrap_or_else(|| DEFAULT_KDE_THEME.to_string())
}

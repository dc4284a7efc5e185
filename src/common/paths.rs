use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory name used under the XDG config directory
pub const APP_DIR_NAME: &str = "alg-welcome";

/// Get the user config directory (`$XDG_CONFIG_HOME` or `~/.config`)
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir().context("Unable to determine user config directory")
}

/// Get the alg-welcome config directory
pub fn welcome_config_dir() -> Result<PathBuf> {
    Ok(user_config_dir()?.join(APP_DIR_NAME))
}

/// Default location of the TOML config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(welcome_config_dir()?.join("config.toml"))
}

/// Per-user XDG autostart directory
pub fn autostart_dir() -> Result<PathBuf> {
    Ok(user_config_dir()?.join("autostart"))
}

/// Home directory, needed by commands that write into `~/.config`
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Unable to determine home directory")
}

/// Candidate kdeglobals locations, most specific first
pub fn kde_globals_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(config) = dirs::config_dir() {
        candidates.push(config.join("kdeglobals"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".kde4/share/config/kdeglobals"));
    }
    candidates.push(PathBuf::from("/etc/kde/kdeglobals"));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kde_candidates_end_with_system_file() {
        let candidates = kde_globals_candidates();
        assert_eq!(
            candidates.last(),
            Some(&PathBuf::from("/etc/kde/kdeglobals"))
        );
        assert!(candidates.iter().all(|p| p.ends_with("kdeglobals")));
    }
}

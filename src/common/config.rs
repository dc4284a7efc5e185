//! User configuration for alg-welcome
//!
//! Every field has a default so a missing or partial `config.toml` is fine.
//! The file lives at `~/.config/alg-welcome/config.toml` unless `--config`
//! points elsewhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::distro::DEFAULT_LIVE_MARKER;
use super::paths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeConfig {
    /// Force a desktop instead of reading `XDG_CURRENT_DESKTOP`
    pub desktop_override: Option<String>,
    /// kdeglobals files to scan, most specific first
    pub kde_config_paths: Option<Vec<PathBuf>>,
    /// Desktop entry copied into the autostart directory
    pub autostart_source: PathBuf,
    /// File name used inside the autostart directory
    pub autostart_file_name: String,
    /// Override for the autostart directory itself
    pub autostart_dir: Option<PathBuf>,
    /// Helper used for privileged operations
    pub privilege_helper: String,
    /// Package manager invocation run inside the desktop terminal
    pub update_command: Vec<String>,
    /// Shell command starting the installer
    pub installer_command: String,
    /// Path whose existence marks a live session
    pub live_marker: PathBuf,
    /// Default timeout for supervised tasks, unset means wait forever
    pub task_timeout_secs: Option<u64>,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            desktop_override: None,
            kde_config_paths: None,
            autostart_source: PathBuf::from("/usr/share/applications/welcome.desktop"),
            autostart_file_name: "welcome.desktop".to_string(),
            autostart_dir: None,
            privilege_helper: "pkexec".to_string(),
            update_command: vec![
                "pacman".to_string(),
                "--noconfirm".to_string(),
                "-Syu".to_string(),
            ],
            installer_command: "sudo calamares -D 8".to_string(),
            live_marker: PathBuf::from(DEFAULT_LIVE_MARKER),
            task_timeout_secs: None,
        }
    }
}

impl WelcomeConfig {
    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::default_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn kde_candidates(&self) -> Vec<PathBuf> {
        match &self.kde_config_paths {
            Some(paths) => paths.clone(),
            None => paths::kde_globals_candidates(),
        }
    }

    pub fn autostart_dir(&self) -> Result<PathBuf> {
        match &self.autostart_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::autostart_dir(),
        }
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config, autostart directory and desktop entry for one test
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let env = Self { temp_dir };
        fs::write(
            env.desktop_entry(),
            "[Desktop Entry]\nType=Application\nName=Welcome\nExec=alg-welcome\n",
        )?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn desktop_entry(&self) -> PathBuf {
        self.path().join("welcome.desktop")
    }

    pub fn autostart_dir(&self) -> PathBuf {
        self.path().join("autostart")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Write a config for `desktop`, followed by any `extra` TOML lines
    pub fn write_config(&self, desktop: &str, extra: &str) -> Result<PathBuf> {
        let content = format!(
            "desktop_override = \"{}\"\nautostart_source = \"{}\"\nautostart_dir = \"{}\"\nlive_marker = \"{}\"\nkde_config_paths = [\"{}\"]\n{}\n",
            desktop,
            self.desktop_entry().display(),
            self.autostart_dir().display(),
            self.path().join("no-live-marker").display(),
            self.path().join("kdeglobals").display(),
            extra
        );
        let path = self.config_path();
        fs::write(&path, content)?;
        Ok(path)
    }
}

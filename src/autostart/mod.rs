//! Start-on-login toggle for the welcome app
//!
//! Enabling copies the packaged desktop entry into the user's XDG autostart
//! directory; disabling removes that copy.

pub mod commands;

use anyhow::{Context, Result};
use duct::cmd;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::common::config::WelcomeConfig;
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutostartChange {
    Enabled,
    AlreadyEnabled,
    Disabled,
    AlreadyDisabled,
}

impl AutostartChange {
    pub fn message(self) -> &'static str {
        match self {
            AutostartChange::Enabled => "Autostart enabled",
            AutostartChange::AlreadyEnabled => "Autostart is already enabled",
            AutostartChange::Disabled => "Autostart disabled",
            AutostartChange::AlreadyDisabled => "Autostart is already disabled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutostartManager {
    source: PathBuf,
    target: PathBuf,
    privilege_helper: String,
}

impl AutostartManager {
    pub fn new(source: PathBuf, target: PathBuf, privilege_helper: impl Into<String>) -> Self {
        Self {
            source,
            target,
            privilege_helper: privilege_helper.into(),
        }
    }

    pub fn from_config(config: &WelcomeConfig) -> Result<Self> {
        let dir = config.autostart_dir()?;
        Ok(Self::new(
            config.autostart_source.clone(),
            dir.join(&config.autostart_file_name),
            config.privilege_helper.clone(),
        ))
    }

    pub fn target(&self) -> &PathBuf {
        &self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.target.exists()
    }

    pub fn enable(&self) -> Result<AutostartChange> {
        if self.is_enabled() {
            return Ok(AutostartChange::AlreadyEnabled);
        }

        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::copy(&self.source, &self.target).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                self.source.display(),
                self.target.display()
            )
        })?;

        emit(
            Level::Debug,
            "autostart.copied",
            &format!("Copied {} to {}", self.source.display(), self.target.display()),
            None,
        );
        Ok(AutostartChange::Enabled)
    }

    /// Remove the autostart entry, escalating only if plain removal is denied
    pub fn disable(&self) -> Result<AutostartChange> {
        if !self.is_enabled() {
            return Ok(AutostartChange::AlreadyDisabled);
        }

        match fs::remove_file(&self.target) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                emit(
                    Level::Debug,
                    "autostart.escalate",
                    &format!(
                        "Removing {} with {}",
                        self.target.display(),
                        self.privilege_helper
                    ),
                    None,
                );
                cmd!(&self.privilege_helper, "rm", "-f", &self.target)
                    .run()
                    .with_context(|| format!("Failed to remove {}", self.target.display()))?;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to remove {}", self.target.display()));
            }
        }

        Ok(AutostartChange::Disabled)
    }
}

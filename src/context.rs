//! Process-wide state resolved once at startup
//!
//! Built in `main` and passed by reference to every component that needs
//! desktop-specific behavior.

use anyhow::Result;
use std::path::PathBuf;

use crate::common::DesktopEnvironment;
use crate::common::config::WelcomeConfig;
use crate::common::distro;
use crate::ui::prelude::*;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub desktop: DesktopEnvironment,
    pub live_session: bool,
    pub config: WelcomeConfig,
    pub home: PathBuf,
}

impl AppContext {
    /// Resolve the desktop and live-session state from the environment
    pub fn from_config(config: WelcomeConfig, force_live: bool) -> Result<Self> {
        let desktop = match &config.desktop_override {
            Some(value) => DesktopEnvironment::from_session_value(value),
            None => DesktopEnvironment::detect(),
        };
        let live_session = force_live || distro::is_live_session(&config.live_marker);
        let home = crate::common::paths::home_dir()?;

        emit(
            Level::Debug,
            "context.resolved",
            &format!(
                "Desktop: {}, live session: {}",
                desktop.name(),
                live_session
            ),
            None,
        );

        Ok(Self {
            desktop,
            live_session,
            config,
            home,
        })
    }

    /// Context with explicit values, bypassing environment detection
    pub fn new(desktop: DesktopEnvironment, config: WelcomeConfig, home: PathBuf) -> Self {
        Self {
            desktop,
            live_session: false,
            config,
            home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_environment() {
        let config = WelcomeConfig {
            desktop_override: Some("XFCE".to_string()),
            live_marker: PathBuf::from("/nonexistent/live/marker"),
            ..WelcomeConfig::default()
        };
        let ctx = AppContext::from_config(config, false).unwrap();
        assert_eq!(ctx.desktop, DesktopEnvironment::Xfce);
        assert!(!ctx.live_session);
    }

    #[test]
    fn test_force_live() {
        let config = WelcomeConfig {
            desktop_override: Some("gnome".to_string()),
            live_marker: PathBuf::from("/nonexistent/live/marker"),
            ..WelcomeConfig::default()
        };
        let ctx = AppContext::from_config(config, true).unwrap();
        assert!(ctx.live_session);
    }
}

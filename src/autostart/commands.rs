use anyhow::Result;
use clap::Subcommand;

use super::AutostartManager;
use crate::context::AppContext;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum AutostartCommands {
    /// Show whether the welcome app starts on login
    Status,
    /// Start the welcome app on login
    Enable,
    /// Stop starting the welcome app on login
    Disable,
}

pub fn handle_autostart_command(ctx: &AppContext, command: AutostartCommands) -> Result<()> {
    let manager = AutostartManager::from_config(&ctx.config)?;

    let change = match command {
        AutostartCommands::Status => {
            let enabled = manager.is_enabled();
            emit(
                Level::Info,
                "autostart.status",
                &format!(
                    "Autostart is {} ({})",
                    if enabled { "enabled" } else { "disabled" },
                    manager.target().display()
                ),
                Some(serde_json::json!({
                    "enabled": enabled,
                    "path": manager.target(),
                })),
            );
            return Ok(());
        }
        AutostartCommands::Enable => manager.enable()?,
        AutostartCommands::Disable => manager.disable()?,
    };

    emit(
        Level::Success,
        "autostart.changed",
        change.message(),
        Some(serde_json::json!({ "change": change })),
    );
    Ok(())
}

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use super::{ThemeReader, is_dark};
use crate::actions::{self, ActionRequest};
use crate::context::AppContext;
use crate::supervisor::Supervisor;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommands {
    /// Show the current theme and whether it is dark
    Status,
    /// Switch to the dark variant
    Dark,
    /// Switch to the light variant
    Light,
    /// Switch to the opposite of the current variant
    Toggle,
}

pub async fn handle_theme_command(
    ctx: &AppContext,
    supervisor: &Supervisor,
    command: ThemeCommands,
) -> Result<()> {
    let reader = ThemeReader::new(ctx.config.kde_candidates());

    let dark = match command {
        ThemeCommands::Status => return show_status(ctx, &reader),
        ThemeCommands::Dark => true,
        ThemeCommands::Light => false,
        ThemeCommands::Toggle => !is_dark(&reader.current_theme(ctx.desktop)),
    };

    let flavor = reader.flavor(ctx.desktop);
    actions::perform(ctx, supervisor, ActionRequest::ToggleTheme { dark, flavor }).await?;

    emit(
        Level::Success,
        "theme.applied",
        &format!(
            "Switched to the {} theme",
            if dark { "dark".bold() } else { "light".bold() }
        ),
        Some(serde_json::json!({
            "desktop": ctx.desktop,
            "dark": dark,
            "flavor": flavor,
        })),
    );
    Ok(())
}

fn show_status(ctx: &AppContext, reader: &ThemeReader) -> Result<()> {
    let theme = reader.current_theme(ctx.desktop);
    let dark = is_dark(&theme);

    emit(
        Level::Info,
        "theme.status",
        &format!(
            "{} theme: {} ({})",
            ctx.desktop.name(),
            if theme.is_empty() { "unknown".dimmed() } else { theme.cyan() },
            if dark { "dark" } else { "light" }
        ),
        Some(serde_json::json!({
            "desktop": ctx.desktop,
            "theme": theme,
            "dark": dark,
        })),
    );
    Ok(())
}

mod actions;
mod autostart;
mod common;
mod context;
mod mirrors;
mod supervisor;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::actions::{ActionRequest, render_plain};
use crate::autostart::AutostartManager;
use crate::autostart::commands::{AutostartCommands, handle_autostart_command};
use crate::common::config::WelcomeConfig;
use crate::context::AppContext;
use crate::mirrors::commands::{MirrorArgs, handle_mirrors_command};
use crate::supervisor::{LogEvent, Supervisor};
use crate::theme::commands::{ThemeCommands, handle_theme_command};
use crate::theme::{ThemeReader, is_dark};
use crate::ui::prelude::*;

/// ALG welcome: desktop onboarding helper
#[derive(Parser, Debug)]
#[command(name = "alg-welcome", author, version, about, long_about = None)]
struct Cli {
    /// Show debug events
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit events as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show desktop, theme, autostart and live session state
    Status,
    /// Inspect or switch the light/dark theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
    /// Update the system in a terminal window
    Update {
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Open the desktop's display settings
    Display,
    /// Refresh the pacman mirror list with reflector
    Mirrors(MirrorArgs),
    /// Start the system installer (live session only)
    Install {
        /// Treat this session as a live session
        #[arg(long)]
        force_live: bool,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Manage starting the welcome app on login
    Autostart {
        #[command(subcommand)]
        command: AutostartCommands,
    },
    /// Open a URL in the default browser
    Open {
        /// URL to open
        url: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    if cli.no_color {
        colored::control::set_override(false);
    }
    ui::init(format, !cli.no_color && !cli.json);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = run(cli).await {
        emit(Level::Error, "error", &format!("Error: {:#}", err), None);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        emit(
            Level::Info,
            "usage",
            "alg-welcome: run with --help for usage",
            None,
        );
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => WelcomeConfig::load_from(path)?,
        None => WelcomeConfig::load()?,
    };

    let force_live = matches!(command, Commands::Install { force_live: true, .. });
    let ctx = AppContext::from_config(config, force_live)?;

    let (tx, mut events) = mpsc::unbounded_channel();
    let supervisor = Supervisor::with_event_sink(tx);

    match command {
        Commands::Status => show_status(&ctx, &supervisor),
        Commands::Theme { command } => handle_theme_command(&ctx, &supervisor, command).await,
        Commands::Update { timeout } => {
            run_supervised(&ctx, &supervisor, &mut events, ActionRequest::UpdateSystem, timeout)
                .await
        }
        Commands::Display => {
            actions::perform_and_follow(
                &ctx,
                &supervisor,
                &mut events,
                ActionRequest::OpenDisplaySettings,
                None,
                render_plain,
            )
            .await
        }
        Commands::Mirrors(args) => handle_mirrors_command(&ctx, &supervisor, &mut events, args).await,
        Commands::Install { timeout, .. } => {
            run_supervised(&ctx, &supervisor, &mut events, ActionRequest::LaunchInstaller, timeout)
                .await
        }
        Commands::Autostart { command } => handle_autostart_command(&ctx, command),
        Commands::Open { url } => common::open::open_url(&url),
    }
}

async fn run_supervised(
    ctx: &AppContext,
    supervisor: &Supervisor,
    events: &mut UnboundedReceiver<LogEvent>,
    request: ActionRequest,
    timeout: Option<u64>,
) -> Result<()> {
    let timeout = timeout
        .map(Duration::from_secs)
        .or(ctx.config.task_timeout());

    emit(
        Level::Info,
        "actions.start",
        &format!("Starting {} on {}", request.label().to_lowercase(), ctx.desktop.name().cyan()),
        None,
    );

    actions::perform_and_follow(ctx, supervisor, events, request, timeout, render_plain).await
}

fn show_status(ctx: &AppContext, supervisor: &Supervisor) -> Result<()> {
    let theme = ThemeReader::new(ctx.config.kde_candidates()).current_theme(ctx.desktop);
    let dark = is_dark(&theme);
    let autostart = AutostartManager::from_config(&ctx.config)
        .context("Failed to resolve the autostart location")?;
    let running = supervisor.running();

    if get_output_format() == OutputFormat::Json {
        emit(
            Level::Info,
            "status",
            "Welcome status",
            Some(serde_json::json!({
                "desktop": ctx.desktop,
                "supported": ctx.desktop.is_supported(),
                "theme": theme,
                "dark": dark,
                "autostart": autostart.is_enabled(),
                "live_session": ctx.live_session,
                "running_tasks": running,
            })),
        );
        return Ok(());
    }

    let yes_no = |value: bool| if value { "yes" } else { "no" };
    let desktop = if ctx.desktop.is_supported() {
        ctx.desktop.name().to_string()
    } else {
        format!("{} (unsupported)", ctx.desktop.name())
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Desktop".to_string(), desktop]);
    table.add_row(vec![
        "Theme".to_string(),
        if theme.is_empty() { "unknown".to_string() } else { theme },
    ]);
    table.add_row(vec!["Dark".to_string(), yes_no(dark).to_string()]);
    table.add_row(vec![
        "Autostart".to_string(),
        yes_no(autostart.is_enabled()).to_string(),
    ]);
    table.add_row(vec![
        "Live session".to_string(),
        yes_no(ctx.live_session).to_string(),
    ]);
    table.add_row(vec![
        "Running tasks".to_string(),
        if running.is_empty() {
            "none".to_string()
        } else {
            running
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        },
    ]);

    println!("{table}");
    Ok(())
}

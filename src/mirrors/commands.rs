use anyhow::Result;
use clap::Args;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use super::log::{LogParser, MirrorLogEntry};
use super::{MIRRORLIST_PATH, MirrorOptions, Protocol, SUGGESTED_COUNTRIES, SortKey};
use crate::actions::{self, ActionRequest, render_plain};
use crate::context::AppContext;
use crate::supervisor::{LogEvent, Supervisor};
use crate::ui::prelude::*;

#[derive(Args, Debug, Clone)]
pub struct MirrorArgs {
    /// Countries to pick mirrors from (repeat or separate with commas)
    #[arg(short, long = "country", value_delimiter = ',')]
    pub countries: Vec<String>,
    /// Allowed protocols
    #[arg(short, long = "protocol", value_enum, value_delimiter = ',', default_value = "https")]
    pub protocols: Vec<Protocol>,
    /// Number of most recently synchronized mirrors to keep (1-20)
    #[arg(long, default_value_t = 5)]
    pub latest: u32,
    /// How to sort the resulting list
    #[arg(long, value_enum, default_value_t = SortKey::Rate)]
    pub sort: SortKey,
    /// Per-mirror download timeout in seconds (5-60)
    #[arg(long, default_value_t = 10)]
    pub download_timeout: u32,
    /// Where the mirror list is written
    #[arg(long, default_value = MIRRORLIST_PATH)]
    pub save: PathBuf,
    /// Print the reflector command instead of running it
    #[arg(long)]
    pub dry_run: bool,
    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl MirrorArgs {
    pub fn to_options(&self, privilege_helper: &str) -> MirrorOptions {
        MirrorOptions {
            countries: self.countries.clone(),
            protocols: self.protocols.clone(),
            latest: self.latest,
            sort: self.sort,
            download_timeout: self.download_timeout,
            save_path: self.save.clone(),
            privilege_helper: privilege_helper.to_string(),
        }
    }
}

pub async fn handle_mirrors_command(
    ctx: &AppContext,
    supervisor: &Supervisor,
    events: &mut UnboundedReceiver<LogEvent>,
    args: MirrorArgs,
) -> Result<()> {
    let options = args.to_options(&ctx.config.privilege_helper);

    let command = match options.command_line() {
        Ok(command) => command,
        Err(err) => {
            emit(
                Level::Info,
                "mirrors.suggestions",
                &format!("Suggested countries: {}", SUGGESTED_COUNTRIES.join(", ")),
                None,
            );
            return Err(err.into());
        }
    };

    if args.dry_run {
        emit(
            Level::Info,
            "mirrors.dry_run",
            &command,
            Some(serde_json::json!({ "options": options })),
        );
        return Ok(());
    }

    let parser = LogParser::new()?;
    let mut servers = Vec::new();
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or(ctx.config.task_timeout());

    emit(
        Level::Info,
        "mirrors.start",
        &format!("Updating mirror list from {}", options.unique_countries().join(", ").cyan()),
        None,
    );

    actions::perform_and_follow(
        ctx,
        supervisor,
        events,
        ActionRequest::RefreshMirrors { command },
        timeout,
        |line| match parser.parse(&line.text) {
            Some(MirrorLogEntry::Server { url, rate, time }) => {
                emit(
                    Level::Info,
                    "mirrors.server",
                    &format!("{}  {}  {}", url, rate.green(), time.dimmed()),
                    Some(serde_json::json!({ "url": url, "rate": rate, "time": time })),
                );
                servers.push((url, rate, time));
            }
            Some(MirrorLogEntry::Info { message }) => {
                emit(Level::Info, "mirrors.info", &message, None);
            }
            Some(MirrorLogEntry::Warning { message }) => {
                emit(Level::Warn, "mirrors.warning", &message, None);
            }
            None => render_plain(line),
        },
    )
    .await?;

    if !servers.is_empty() && get_output_format() == OutputFormat::Text {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Server", "Rate", "Time"]);
        for (url, rate, time) in &servers {
            table.add_row(vec![url, rate, time]);
        }
        println!("{table}");
    }

    emit(
        Level::Success,
        "mirrors.saved",
        &format!("✓ Mirror list saved to {}", options.save_path.display()),
        None,
    );
    Ok(())
}

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use crate::ui::prelude::*;

/// Open a URL in the user's default handler
pub fn open_url(url: &str) -> Result<()> {
    emit(
        Level::Debug,
        "open.url",
        &format!("Opening {} with xdg-open", url),
        None,
    );

    Command::new("xdg-open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .with_context(|| format!("Failed to open {}", url))
}

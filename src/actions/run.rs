use anyhow::{Context, Result, bail};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{ActionRequest, CommandSpec, Dispatcher, ExecutionMode, follow};
use crate::common::progress::{create_spinner, finish_spinner_with_success};
use crate::context::AppContext;
use crate::supervisor::{LogEvent, LogLine, Supervisor, TaskHandle};
use crate::ui::prelude::*;

/// What happened to an action after it was dispatched
#[derive(Debug)]
pub enum ActionOutcome {
    /// Blocking command ran to completion successfully
    Finished,
    /// Detached command was started and left alone
    Detached,
    /// Long-running command is under supervision
    Supervised(TaskHandle),
}

/// Build the command for `request` on the current desktop and run it
pub async fn perform(
    ctx: &AppContext,
    supervisor: &Supervisor,
    request: ActionRequest,
) -> Result<ActionOutcome> {
    if request == ActionRequest::LaunchInstaller && !ctx.live_session {
        bail!("The installer can only be started from a live session (use --force-live to override)");
    }

    let spec = Dispatcher::from_context(ctx).build(ctx.desktop, &request)?;

    which::which(&spec.program)
        .with_context(|| format!("{} requires '{}', which is not installed", request.label(), spec.program))?;

    emit(
        Level::Debug,
        "actions.dispatch",
        &format!("{}: {}", request.label(), spec.command_line()),
        None,
    );

    match spec.mode {
        ExecutionMode::Blocking => {
            run_blocking(&spec, request.label()).await?;
            Ok(ActionOutcome::Finished)
        }
        ExecutionMode::Detached => {
            std::process::Command::new(&spec.program)
                .args(&spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .with_context(|| format!("Failed to start {}", spec.program))?;
            Ok(ActionOutcome::Detached)
        }
        ExecutionMode::Supervised { task } => {
            let handle = supervisor.launch(task, &spec.program, &spec.args)?;
            Ok(ActionOutcome::Supervised(handle))
        }
    }
}

/// `perform`, then follow a supervised task's output until it exits
pub async fn perform_and_follow<F>(
    ctx: &AppContext,
    supervisor: &Supervisor,
    events: &mut UnboundedReceiver<LogEvent>,
    request: ActionRequest,
    timeout: Option<Duration>,
    render: F,
) -> Result<()>
where
    F: FnMut(&LogLine),
{
    let label = request.label();
    match perform(ctx, supervisor, request).await? {
        ActionOutcome::Supervised(handle) => {
            follow(handle, events, timeout, render).await?;
        }
        ActionOutcome::Detached => {
            emit(Level::Success, "actions.started", &format!("✓ {} opened", label), None);
        }
        ActionOutcome::Finished => {}
    }
    Ok(())
}

async fn run_blocking(spec: &CommandSpec, label: &str) -> Result<()> {
    let pb = create_spinner(format!("{}...", label));

    let output = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            pb.finish_and_clear();
            return Err(err).with_context(|| format!("Failed to run {}", spec.program));
        }
    };

    if !output.status.success() {
        pb.finish_and_clear();
        bail!(
            "{} failed ({}): {}",
            label,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    finish_spinner_with_success(pb, format!("{} done", label));
    Ok(())
}

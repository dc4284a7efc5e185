use anyhow::{Result, bail};
use colored::*;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::supervisor::{ExitResult, LogEvent, LogLine, StreamSource, TaskHandle};
use crate::ui::prelude::*;

/// Render a supervised task's log events until its completion sentinel,
/// then collect the exit result.
///
/// `events` is the receiving end of the supervisor's event sink. Events of
/// other tasks are skipped. `timeout` terminates the task once elapsed.
pub async fn follow<F>(
    handle: TaskHandle,
    events: &mut UnboundedReceiver<LogEvent>,
    timeout: Option<Duration>,
    mut render: F,
) -> Result<ExitResult>
where
    F: FnMut(&LogLine),
{
    let task = handle.name().to_string();
    let waiter = tokio::spawn(handle.wait_timeout(timeout));

    while let Some(event) = events.recv().await {
        match event {
            LogEvent::Line { task: owner, line } if owner == task => render(&line),
            LogEvent::Completed { task: owner, .. } if owner == task => {
                emit(Level::Info, "log.completed", "Logging completed.", None);
                break;
            }
            _ => {}
        }
    }

    let result = waiter.await?;
    if let Some(failure) = &result.failure {
        bail!("{} {}", task, failure);
    }

    emit(
        Level::Success,
        "task.finished",
        &format!("✓ {} finished in {:.1?}", task, result.elapsed),
        Some(serde_json::json!({
            "task": task,
            "exit_code": result.exit_code,
        })),
    );
    Ok(result)
}

/// Print a child output line as-is, stderr dimmed
pub fn render_plain(line: &LogLine) {
    match line.source {
        StreamSource::Stdout => emit(Level::Info, "log.line", &line.text, None),
        StreamSource::Stderr => emit(
            Level::Info,
            "log.line",
            &line.text.dimmed().to_string(),
            Some(serde_json::json!({ "stream": "stderr" })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::Supervisor;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_follow_renders_lines_until_sentinel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::with_event_sink(tx);
        let handle = supervisor
            .launch(
                "mirrorlist-update",
                "sh",
                &["-c".to_string(), "echo first; echo second >&2".to_string()],
            )
            .unwrap();

        let mut seen = Vec::new();
        let result = follow(handle, &mut rx, None, |line| seen.push(line.text.clone()))
            .await
            .unwrap();

        seen.sort();
        assert_eq!(seen, vec!["first", "second"]);
        assert_eq!(result.exit_code, Some(0));
        assert!(!supervisor.is_running("mirrorlist-update"));
    }

    #[tokio::test]
    async fn test_follow_reports_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::with_event_sink(tx);
        let handle = supervisor
            .launch("system-update", "sh", &["-c".to_string(), "exit 2".to_string()])
            .unwrap();

        let err = follow(handle, &mut rx, None, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("exited with status 2"));
    }

    #[tokio::test]
    async fn test_follow_times_out() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::with_event_sink(tx);
        let handle = supervisor
            .launch("installer", "sleep", &["30".to_string()])
            .unwrap();

        let err = follow(handle, &mut rx, Some(Duration::from_millis(100)), |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// One line of child output, without its line terminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub source: StreamSource,
    pub text: String,
}

/// Event published on the supervisor's "log" sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum LogEvent {
    Line { task: String, line: LogLine },
    /// Sent once per task, after every line of that task
    Completed { task: String, exit_code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    #[error("exited with status {0}")]
    NonZeroExit(i32),
    #[error("terminated by a signal")]
    Signalled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("failed to wait for process: {0}")]
    Wait(String),
    #[error("failed to read {stream:?}: {message}")]
    StreamRead {
        stream: StreamSource,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub task: String,
    pub exit_code: Option<i32>,
    pub failure: Option<TaskFailure>,
    pub elapsed: Duration,
}

impl ExitResult {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Stop request sent from a handle to the task's waiter
#[derive(Debug, Clone, Copy)]
pub(super) enum StopRequest {
    Cancel,
    Timeout(Duration),
}

impl StopRequest {
    pub(super) fn failure(self) -> TaskFailure {
        match self {
            StopRequest::Cancel => TaskFailure::Cancelled,
            StopRequest::Timeout(limit) => TaskFailure::TimedOut(limit),
        }
    }
}

/// Lines of one task in arrival order. Ends once both pipes are closed.
#[derive(Debug)]
pub struct LineStream {
    rx: mpsc::UnboundedReceiver<LogLine>,
}

impl LineStream {
    pub async fn next(&mut self) -> Option<LogLine> {
        self.rx.recv().await
    }

    pub async fn collect(mut self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        while let Some(line) = self.next().await {
            lines.push(line);
        }
        lines
    }
}

/// Handle to one launched task.
///
/// Dropping the handle does not stop the process; its registry slot is
/// freed when the process exits.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    pid: Option<u32>,
    lines: Option<mpsc::UnboundedReceiver<LogLine>>,
    stop: mpsc::UnboundedSender<StopRequest>,
    result: oneshot::Receiver<ExitResult>,
}

impl TaskHandle {
    pub(super) fn new(
        name: String,
        pid: Option<u32>,
        lines: mpsc::UnboundedReceiver<LogLine>,
        stop: mpsc::UnboundedSender<StopRequest>,
        result: oneshot::Receiver<ExitResult>,
    ) -> Self {
        Self {
            name,
            pid,
            lines: Some(lines),
            stop,
            result,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the line stream. Only the first call returns it.
    pub fn take_lines(&mut self) -> Option<LineStream> {
        self.lines.take().map(|rx| LineStream { rx })
    }

    /// Ask the process to terminate. Returns immediately.
    pub fn cancel(&self) {
        let _ = self.stop.send(StopRequest::Cancel);
    }

    /// Wait for the process to exit and its output to drain
    pub async fn wait(self) -> ExitResult {
        let name = self.name;
        self.result.await.unwrap_or_else(|_| lost_result(name))
    }

    /// Like `wait`, but terminates the process once `limit` elapses
    pub async fn wait_timeout(self, limit: Option<Duration>) -> ExitResult {
        let Some(limit) = limit else {
            return self.wait().await;
        };

        let TaskHandle {
            name,
            stop,
            mut result,
            ..
        } = self;

        tokio::select! {
            res = &mut result => res.unwrap_or_else(|_| lost_result(name)),
            _ = tokio::time::sleep(limit) => {
                let _ = stop.send(StopRequest::Timeout(limit));
                result.await.unwrap_or_else(|_| lost_result(name))
            }
        }
    }
}

fn lost_result(task: String) -> ExitResult {
    ExitResult {
        task,
        exit_code: None,
        failure: Some(TaskFailure::Wait(
            "supervisor task ended without a result".to_string(),
        )),
        elapsed: Duration::ZERO,
    }
}

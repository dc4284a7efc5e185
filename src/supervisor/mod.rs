//! Process supervisor
//!
//! Launches long-running external commands under a logical task name,
//! allows at most one live process per name, and streams combined
//! stdout/stderr line by line while the process runs. Must be used from
//! within a Tokio runtime.

pub mod registry;
mod stream;
pub mod task;

use chrono::{DateTime, Local};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::ui::prelude::*;

pub use registry::{RunningTask, TaskRegistry};
pub use task::{ExitResult, LineStream, LogEvent, LogLine, StreamSource, TaskFailure, TaskHandle};

use registry::Registration;
use task::StopRequest;

/// Time a process gets to exit after SIGTERM before it is killed
const KILL_GRACE: Duration = Duration::from_secs(3);
/// Time the readers get to drain after the process exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("'{name}' is already running (started {since})")]
    AlreadyRunning {
        name: String,
        since: DateTime<Local>,
    },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to capture output of {program}")]
    Pipe { program: String },
}

#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    registry: TaskRegistry,
    events: Option<mpsc::UnboundedSender<LogEvent>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supervisor that also publishes every line and completion to `sink`
    pub fn with_event_sink(sink: mpsc::UnboundedSender<LogEvent>) -> Self {
        Self {
            registry: TaskRegistry::new(),
            events: Some(sink),
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.registry.is_running(name)
    }

    pub fn running(&self) -> Vec<RunningTask> {
        self.registry.snapshot()
    }

    /// Start `program` as task `name`.
    ///
    /// Fails without spawning anything if `name` is already live. Spawn and
    /// pipe failures leave `name` free.
    pub fn launch(
        &self,
        name: &str,
        program: &str,
        args: &[String],
    ) -> Result<TaskHandle, SupervisorError> {
        let registration =
            self.registry
                .try_register(name)
                .map_err(|existing| SupervisorError::AlreadyRunning {
                    name: name.to_string(),
                    since: existing.started_at,
                })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.start_kill();
            return Err(SupervisorError::Pipe {
                program: program.to_string(),
            });
        };

        let pid = child.id();
        if let Some(pid) = pid {
            registration.set_pid(pid);
        }

        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();

        let readers = vec![
            (
                StreamSource::Stdout,
                tokio::spawn(stream::forward_lines(
                    stdout,
                    StreamSource::Stdout,
                    name.to_string(),
                    line_tx.clone(),
                    self.events.clone(),
                )),
            ),
            (
                StreamSource::Stderr,
                tokio::spawn(stream::forward_lines(
                    stderr,
                    StreamSource::Stderr,
                    name.to_string(),
                    line_tx,
                    self.events.clone(),
                )),
            ),
        ];

        emit(
            Level::Debug,
            "supervisor.launch",
            &format!("Started '{}' ({} {:?}) pid {:?}", name, program, args, pid),
            None,
        );

        tokio::spawn(supervise(Supervised {
            child,
            registration,
            readers,
            stop: stop_rx,
            result: result_tx,
            events: self.events.clone(),
            started: Instant::now(),
        }));

        Ok(TaskHandle::new(
            name.to_string(),
            pid,
            line_rx,
            stop_tx,
            result_rx,
        ))
    }
}

struct Supervised {
    child: Child,
    registration: Registration,
    readers: Vec<(StreamSource, JoinHandle<io::Result<usize>>)>,
    stop: mpsc::UnboundedReceiver<StopRequest>,
    result: oneshot::Sender<ExitResult>,
    events: Option<mpsc::UnboundedSender<LogEvent>>,
    started: Instant,
}

enum Outcome {
    Exited(io::Result<ExitStatus>),
    Stopped(StopRequest),
}

async fn supervise(mut task: Supervised) {
    let name = task.registration.name().to_string();

    // A closed stop channel (handle dropped) just disables that branch.
    let outcome = tokio::select! {
        status = task.child.wait() => Outcome::Exited(status),
        Some(request) = task.stop.recv() => Outcome::Stopped(request),
    };

    let (status, mut failure) = match outcome {
        Outcome::Exited(status) => (status, None),
        Outcome::Stopped(request) => {
            emit(
                Level::Debug,
                "supervisor.stop",
                &format!("Stopping '{}': {}", name, request.failure()),
                None,
            );
            (terminate(&mut task.child, &name).await, Some(request.failure()))
        }
    };

    for (source, mut reader) in task.readers {
        match tokio::time::timeout(DRAIN_GRACE, &mut reader).await {
            Ok(Ok(Ok(_))) => {}
            Ok(Ok(Err(err))) => {
                failure.get_or_insert(TaskFailure::StreamRead {
                    stream: source,
                    message: err.to_string(),
                });
            }
            Ok(Err(join_err)) => {
                failure.get_or_insert(TaskFailure::StreamRead {
                    stream: source,
                    message: join_err.to_string(),
                });
            }
            Err(_) => {
                // Something inherited the pipe and outlived the process.
                reader.abort();
                emit(
                    Level::Warn,
                    "supervisor.drain_timeout",
                    &format!("Stopped reading {:?} of '{}' after exit", source, name),
                    None,
                );
            }
        }
    }

    let exit_code = match &status {
        Ok(status) => {
            if failure.is_none() && !status.success() {
                failure = Some(match status.code() {
                    Some(code) => TaskFailure::NonZeroExit(code),
                    None => TaskFailure::Signalled,
                });
            }
            status.code()
        }
        Err(err) => {
            failure.get_or_insert(TaskFailure::Wait(err.to_string()));
            None
        }
    };

    drop(task.registration);

    if let Some(events) = &task.events {
        let _ = events.send(LogEvent::Completed {
            task: name.clone(),
            exit_code,
        });
    }

    let result = ExitResult {
        task: name,
        exit_code,
        failure,
        elapsed: task.started.elapsed(),
    };

    emit(
        Level::Debug,
        "supervisor.exit",
        &format!(
            "'{}' finished in {:.1?}: {}",
            result.task,
            result.elapsed,
            match &result.failure {
                Some(failure) => failure.to_string(),
                None => "ok".to_string(),
            }
        ),
        None,
    );

    let _ = task.result.send(result);
}

/// SIGTERM, then SIGKILL if the process outlives the grace period
async fn terminate(child: &mut Child, name: &str) -> io::Result<ExitStatus> {
    if let Some(pid) = child.id()
        && let Err(err) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
    {
        emit(
            Level::Warn,
            "supervisor.signal_failed",
            &format!("Could not send SIGTERM to '{}' ({}): {}", name, pid, err),
            None,
        );
    }

    match tokio::time::timeout(KILL_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            let _ = child.start_kill();
            child.wait().await
        }
    }
}

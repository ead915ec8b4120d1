// src/exec/process.rs

//! Supervised child process with signal forwarding.
//!
//! A [`SupervisedProcess`] runs one command line at a time. While a child is
//! live, [`SupervisedProcess::forward_signal`] hands a signal request to the
//! supervising future over a channel; the supervisor delivers it with
//! `kill(pid, sig)` only while the child has not been reaped, so a recycled
//! pid is never signalled.

use std::process::{ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard};

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ActionError;
use crate::types::Signal;

/// Program, arguments and extra environment for one child process.
///
/// The child always inherits the parent environment; `env` entries are
/// applied on top, in order, so later entries win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    /// Split an argv into program and arguments. `None` for an empty argv.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            env: Vec::new(),
        })
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }
}

struct SignalRequest {
    signal: Signal,
    reply: oneshot::Sender<Result<bool, ActionError>>,
}

pub struct SupervisedProcess {
    line: CommandLine,
    signal: Signal,
    ignore_signals: bool,
    live: Mutex<Option<mpsc::UnboundedSender<SignalRequest>>>,
}

impl std::fmt::Debug for SupervisedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedProcess")
            .field("line", &self.line)
            .field("signal", &self.signal)
            .field("ignore_signals", &self.ignore_signals)
            .finish_non_exhaustive()
    }
}

impl SupervisedProcess {
    pub fn new(line: CommandLine, signal: Signal, ignore_signals: bool) -> Self {
        Self {
            line,
            signal,
            ignore_signals,
            live: Mutex::new(None),
        }
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.line
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Spawn the child and supervise it until it exits or `cancel` fires.
    ///
    /// A non-zero exit (including termination by a forwarded signal) is an
    /// error. Cancellation kills the child and is not.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ActionError> {
        let mut command = Command::new(&self.line.program);
        command
            .args(&self.line.args)
            .envs(self.line.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| ActionError::Spawn {
            program: self.line.program.clone(),
            source,
        })?;

        info!(program = %self.line.program, pid = ?child.id(), "started process");

        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.live_slot() = Some(tx);

        let outcome = self.supervise(&mut child, &mut rx, &cancel).await;

        // Pending requests observe a dropped reply sender and report "not signalled".
        self.live_slot().take();
        outcome
    }

    /// Deliver the configured signal to the live child, if any.
    ///
    /// Returns `Ok(true)` when the signal was delivered (or signals are
    /// ignored for this backend), `Ok(false)` when no child is live.
    pub async fn forward_signal(&self) -> Result<bool, ActionError> {
        if self.ignore_signals {
            return Ok(true);
        }
        let Some(tx) = self.live_slot().clone() else {
            return Ok(false);
        };

        let (reply, response) = oneshot::channel();
        let request = SignalRequest {
            signal: self.signal,
            reply,
        };
        if tx.send(request).is_err() {
            return Ok(false);
        }
        response.await.unwrap_or(Ok(false))
    }

    async fn supervise(
        &self,
        child: &mut Child,
        requests: &mut mpsc::UnboundedReceiver<SignalRequest>,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        loop {
            tokio::select! {
                status = child.wait() => {
                    let status = status.map_err(|source| ActionError::Wait {
                        program: self.line.program.clone(),
                        source,
                    })?;
                    return self.check_status(status);
                }
                Some(request) = requests.recv() => {
                    let delivered = deliver(child, request.signal);
                    if let Err(err) = &delivered {
                        warn!(program = %self.line.program, error = %err, "signal delivery failed");
                    }
                    let _ = request.reply.send(delivered);
                }
                _ = cancel.cancelled() => {
                    debug!(program = %self.line.program, "session cancelled; killing process");
                    if let Err(err) = child.kill().await {
                        warn!(program = %self.line.program, error = %err, "failed to kill process");
                    }
                    return Ok(());
                }
            }
        }
    }

    fn check_status(&self, status: ExitStatus) -> Result<(), ActionError> {
        info!(program = %self.line.program, %status, "process exited");
        if status.success() {
            Ok(())
        } else {
            Err(ActionError::ExitStatus {
                program: self.line.program.clone(),
                status: status.to_string(),
            })
        }
    }

    fn live_slot(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<SignalRequest>>> {
        match self.live.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(unix)]
fn deliver(child: &mut Child, signal: Signal) -> Result<bool, ActionError> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // `id()` is `None` once the child has been reaped.
    let Some(pid) = child.id() else {
        return Ok(false);
    };
    kill(Pid::from_raw(pid as i32), signal.to_nix()).map_err(|errno| ActionError::Signal {
        signal,
        pid,
        message: errno.to_string(),
    })?;
    debug!(pid, %signal, "forwarded signal");
    Ok(true)
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, signal: Signal) -> Result<bool, ActionError> {
    let Some(pid) = child.id() else {
        return Ok(false);
    };
    child.start_kill().map_err(|err| ActionError::Signal {
        signal,
        pid,
        message: err.to_string(),
    })?;
    Ok(true)
}

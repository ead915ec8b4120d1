// src/output.rs

//! User-facing structured records.
//!
//! Independently of `tracing` diagnostics, watchfs prints one JSON object per
//! line: filesystem events on stdout (unless quiet) and errors, warnings and
//! info messages on stderr. Each stream is guarded by its own mutex so
//! records from concurrent actions never interleave.
//!
//! A single [`Reporter`] is built at startup and shared (via `Arc`) with the
//! session and every action pipeline.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

use crate::watch::Event;

type Sink = Mutex<Box<dyn Write + Send>>;

pub struct Reporter {
    stdout: Sink,
    stderr: Sink,
    quiet: bool,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EventRecord<'a> {
    op: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct ErrorRecord<T: Serialize> {
    error: T,
}

#[derive(Serialize)]
struct WarningRecord<'a> {
    warning: &'a str,
}

#[derive(Serialize)]
struct InfoRecord<'a> {
    info: &'a str,
}

/// Payload of an action failure record.
#[derive(Debug, Serialize)]
pub struct ActionFailure<'a> {
    pub message: String,
    pub action: &'a str,
    pub kind: &'a str,
}

/// Payload of a filesystem failure record (directory walk or registration).
#[derive(Debug, Serialize)]
pub struct PathFailure<'a> {
    pub op: &'a str,
    pub path: String,
    pub message: String,
}

impl Reporter {
    /// Reporter bound to the process's stdout and stderr.
    pub fn stdio(quiet: bool) -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()), quiet)
    }

    pub fn with_writers(
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
        quiet: bool,
    ) -> Self {
        Self {
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
            quiet,
        }
    }

    /// `{"op":"write","path":"./main.go"}` on stdout, unless quiet.
    pub fn event(&self, event: &Event) {
        if self.quiet {
            return;
        }
        let path = event.path.to_string_lossy();
        emit(
            &self.stdout,
            &EventRecord {
                op: event.op.as_str(),
                path: &path,
            },
        );
    }

    /// `{"error": <payload>}` on stderr.
    pub fn error<T: Serialize>(&self, error: T) {
        emit(&self.stderr, &ErrorRecord { error });
    }

    pub fn warning(&self, message: &str) {
        emit(&self.stderr, &WarningRecord { warning: message });
    }

    pub fn info(&self, message: &str) {
        emit(&self.stderr, &InfoRecord { info: message });
    }
}

fn emit<T: Serialize>(sink: &Sink, record: &T) {
    let line = match serde_json::to_string(record) {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "failed to encode output record");
            return;
        }
    };
    let mut writer = match sink.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Err(err) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
        warn!(error = %err, "failed to write output record");
    }
}

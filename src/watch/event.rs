// src/watch/event.rs

use std::path::PathBuf;

use chrono::{DateTime, Local};
use notify::event::{EventKind, ModifyKind};

use crate::types::Operation;

/// A single filesystem change, produced once per path in a notify event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub path: PathBuf,
    pub op: Operation,
    pub time: DateTime<Local>,
}

impl Event {
    pub fn new(path: impl Into<PathBuf>, op: Operation) -> Self {
        Self {
            path: path.into(),
            op,
            time: Local::now(),
        }
    }

    /// RFC 3339 rendering of the event timestamp.
    pub fn timestamp(&self) -> String {
        self.time.to_rfc3339()
    }
}

/// Map a notify event kind onto the operation set we filter on.
///
/// Access notifications and unclassified events carry no change and are
/// dropped.
pub fn operation_of(kind: &EventKind) -> Option<Operation> {
    match kind {
        EventKind::Create(_) => Some(Operation::Create),
        EventKind::Remove(_) => Some(Operation::Remove),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Operation::Chmod),
        EventKind::Modify(ModifyKind::Name(_)) => Some(Operation::Rename),
        EventKind::Modify(_) => Some(Operation::Write),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Split a raw notify event into one [`Event`] per affected path.
pub fn events_from_notify(raw: notify::Event) -> Vec<Event> {
    let Some(op) = operation_of(&raw.kind) else {
        return Vec::new();
    };
    raw.paths.into_iter().map(|path| Event::new(path, op)).collect()
}

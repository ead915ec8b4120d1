// src/watch/event_handler.rs

//! Session-wide routing of filesystem events.
//!
//! For every event the session asks, in order:
//! 1. is this a write to our own configuration file (self-reload)?
//! 2. does it pass the global gates (top-level filter, ignore filters,
//!    ignore globs)?
//! 3. which actions' own filters match it?

use std::path::PathBuf;

use crate::config::Configuration;
use crate::types::Operation;
use crate::watch::event::Event;
use crate::watch::path_utils::absolute;

#[derive(Debug, Clone)]
pub struct EventRouter<'a> {
    config: &'a Configuration,
    config_path: Option<PathBuf>,
}

impl<'a> EventRouter<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        let config_path = config
            .source
            .as_deref()
            .filter(|_| config.watch_self)
            .map(absolute);
        Self {
            config,
            config_path,
        }
    }

    /// A write to the loaded configuration file while `watch_self` is on.
    pub fn is_config_write(&self, event: &Event) -> bool {
        match &self.config_path {
            Some(path) => event.op == Operation::Write && absolute(&event.path) == *path,
            None => false,
        }
    }

    /// Global gates: the top-level filter is a soft gate (`all || any`);
    /// an ignore filter suppresses only on a full match (`all && any`);
    /// any matching ignore glob suppresses.
    pub fn passes_global(&self, event: &Event) -> bool {
        if !self.config.filter.matches(event).passes() {
            return false;
        }
        if self
            .config
            .ignores
            .iter()
            .any(|ignore| ignore.matches(event).is_full())
        {
            return false;
        }
        !self.config.ignore_globs.is_match(&event.path)
    }

    /// Indices of the actions whose own filters accept `event`.
    pub fn matching_actions(&self, event: &Event) -> Vec<usize> {
        self.config
            .actions
            .iter()
            .enumerate()
            .filter(|(_, action)| action.matches(event))
            .map(|(index, _)| index)
            .collect()
    }
}

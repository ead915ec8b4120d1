// src/config/settings.rs

//! Canonical, validated configuration used by the engine.
//!
//! Produced from a [`RawConfiguration`](crate::config::RawConfiguration) once
//! per session. A reload builds a brand-new `Configuration`; live values are
//! never mutated.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{ActionKind, Signal};
use crate::watch::{Event, Filter, GlobList};

#[derive(Debug, Clone)]
pub struct Configuration {
    /// Absolute path of the file this configuration was loaded from, if any.
    pub source: Option<PathBuf>,
    pub watch_paths: Vec<PathBuf>,
    pub filter: Filter,
    pub ignores: Vec<Filter>,
    pub ignore_globs: GlobList,
    pub env: BTreeMap<String, String>,
    pub delay: Duration,
    pub signal: Signal,
    pub shell: Vec<String>,
    pub actions: Vec<Action>,
    pub watch_self: bool,
    /// Non-fatal problems found while canonicalising (reported at session start).
    pub warnings: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source: None,
            watch_paths: vec![PathBuf::from(".")],
            filter: Filter::empty(),
            ignores: Vec::new(),
            ignore_globs: GlobList::default(),
            env: BTreeMap::new(),
            delay: Duration::ZERO,
            signal: Signal::default(),
            shell: default_shell(),
            actions: Vec::new(),
            watch_self: true,
            warnings: Vec::new(),
        }
    }
}

/// A configured rule: a filter plus exactly one backend.
#[derive(Debug, Clone)]
pub struct Action {
    pub name: String,
    pub filter: Filter,
    pub ignore: Option<Filter>,
    pub delay: Duration,
    /// Lock names, sorted and de-duplicated.
    pub locks: Vec<String>,
    /// Per-action signal override.
    pub signal: Option<Signal>,
    pub run_on_start: bool,
    pub backend: BackendSpec,
}

impl Action {
    /// Whether an event passes this action's own filters.
    ///
    /// The action filter is a soft gate (`all || any`); the ignore filter only
    /// suppresses on a full match (`all && any`).
    pub fn matches(&self, event: &Event) -> bool {
        if !self.filter.matches(event).passes() {
            return false;
        }
        if let Some(ignore) = &self.ignore {
            if ignore.matches(event).is_full() {
                return false;
            }
        }
        true
    }

    pub fn kind(&self) -> ActionKind {
        self.backend.kind()
    }

    /// Signal to forward: action override, else the global signal.
    pub fn effective_signal(&self, global: Signal) -> Signal {
        self.signal.unwrap_or(global)
    }
}

/// Backend of an action, as configured.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSpec {
    Exec(ExecSpec),
    Shell(ShellSpec),
    ContainerRun(ContainerSpec),
    HttpGet(HttpGetSpec),
}

impl BackendSpec {
    pub fn kind(&self) -> ActionKind {
        match self {
            BackendSpec::Exec(_) => ActionKind::Exec,
            BackendSpec::Shell(_) => ActionKind::Shell,
            BackendSpec::ContainerRun(_) => ActionKind::DockerRun,
            BackendSpec::HttpGet(_) => ActionKind::HttpGet,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecSpec {
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub ignore_signals: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellSpec {
    pub command: String,
    pub env: BTreeMap<String, String>,
    pub ignore_signals: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub runtime: String,
    pub image: String,
    pub entrypoint: Option<String>,
    pub command: Option<Vec<String>>,
    pub env: BTreeMap<String, String>,
    pub extra_args: Vec<String>,
    pub workdir: Option<String>,
    pub volumes: Vec<Volume>,
    pub ignore_signals: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub kind: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpGetSpec {
    pub url: String,
}

/// Shell used for `shell` actions when none is configured: `$SHELL -c`,
/// falling back to `sh -c` (`cmd /C` on Windows).
pub fn default_shell() -> Vec<String> {
    if cfg!(windows) {
        return vec!["cmd".to_string(), "/C".to_string()];
    }
    let shell = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "sh".to_string());
    vec![shell, "-c".to_string()]
}

// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration as read from `watchfs.yaml` / `.json` / `.toml`
/// (or a `nodemon.json`).
///
/// ```yaml
/// paths: ["."]
/// exts: [go]
/// ignore: [".git", "vendor"]
/// delay: 200ms
/// signal: SIGTERM
/// actions:
///   - exec: { command: [go, test, ./...] }
///     locks: [go]
///   - shell: { command: "make lint" }
///     exts: [go]
///     locks: [go]
/// ```
///
/// This is the user-facing shape only; it is turned into a
/// [`Configuration`](crate::config::Configuration) by
/// [`TryFrom`](crate::config::validate), which parses names, compiles globs
/// and fills in defaults. All keys are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfiguration {
    /// Directories to watch recursively.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    /// Alias of `paths` (nodemon's spelling); both lists are merged.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watch: Vec<String>,

    /// Global extension filter as a comma-separated string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<String>,

    /// Global operation filter as a comma-separated string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<String>,

    /// Raw path globs; matching events are dropped and matching directories
    /// are not watched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// Ignore filters; an event that fully matches one of them is dropped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignores: Vec<RawFilter>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Extension -> command line; each entry becomes an `exec` action.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub exec_map: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySetting>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,

    /// Shell used by `shell` actions, as one string or an argv list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<ShellSetting>,

    /// Restart the session when the configuration file itself is written.
    #[serde(rename = "self", alias = "watchSelf", skip_serializing_if = "Option::is_none")]
    pub watch_self: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<RawAction>,
}

/// `delay` accepts a bare number of milliseconds or a duration string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelaySetting {
    Millis(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShellSetting {
    Line(String),
    Argv(Vec<String>),
}

/// Filter keys, shared by the action entries (inline) and `ignores` / an
/// action's `ignore`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<String>,

    /// Shell globs matched against the event path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    /// Alias of `paths`; both lists are merged.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watch: Vec<String>,
}

impl RawFilter {
    pub fn is_empty(&self) -> bool {
        self == &RawFilter::default()
    }
}

/// One entry of `actions`.
///
/// Exactly one of `exec`, `shell`, `dockerRun` and `httpGet` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAction {
    /// Optional label used in logs and error records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<RawExec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<RawShell>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_run: Option<RawDockerRun>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_get: Option<RawHttpGet>,

    #[serde(flatten)]
    pub filter: RawFilter,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<RawFilter>,

    /// Debounce delay; defaults to the top-level `delay`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySetting>,

    /// Signal sent to a running process on new events; overrides the
    /// top-level `signal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,

    /// Named locks held while the action runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locks: Vec<String>,

    /// Run once when the session starts (default true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_on_start: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawExec {
    pub command: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignore_signals: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawShell {
    pub command: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignore_signals: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDockerRun {
    pub image: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<RawVolume>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignore_signals: bool,

    /// Container runtime CLI; defaults to `docker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawVolume {
    pub source: String,
    pub target: String,

    /// Mount type; defaults to `bind`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHttpGet {
    pub url: String,
}

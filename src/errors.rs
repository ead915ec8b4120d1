// src/errors.rs

//! Crate-wide error types.
//!
//! - [`WatchfsError`] covers configuration loading and watcher setup.
//! - [`ActionError`] is what an action backend reports when a run fails;
//!   it never aborts the watch loop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchfsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Watcher error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single action run (or of forwarding a signal to it).
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deliver {signal} to pid {pid}: {message}")]
    Signal {
        signal: crate::types::Signal,
        pid: u32,
        message: String,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed writing HTTP response: {0}")]
    Output(#[from] std::io::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchfsError>;

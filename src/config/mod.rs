// src/config/mod.rs

//! Configuration loading and validation for watchfs.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a config file from disk in YAML, JSON or TOML (`loader.rs`).
//! - Turn the raw model into the canonical [`Configuration`] the engine
//!   runs on (`validate.rs`, `settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{discover_config_path, load_and_validate, load_from_path, ConfigFormat};
pub use model::{
    DelaySetting, RawAction, RawConfiguration, RawDockerRun, RawExec, RawFilter, RawHttpGet,
    RawShell, RawVolume, ShellSetting,
};
pub use settings::{
    Action, BackendSpec, Configuration, ContainerSpec, ExecSpec, HttpGetSpec, ShellSpec, Volume,
};

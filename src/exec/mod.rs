// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`backend`] holds the `ActionBackend` capability trait, the production
//!   `Backend` sum type and the factory sessions use to build backends.
//! - [`process`] supervises one child process and forwards signals to it.
//! - [`command`] implements the `exec` and `shell` backends.
//! - [`container`] implements `dockerRun` (argument assembly + process).
//! - [`http`] implements `httpGet`.

pub mod backend;
pub mod command;
pub mod container;
pub mod http;
pub mod process;

pub use backend::{ActionBackend, Backend, BackendFactory, BoxFuture, SystemBackends};
pub use process::{CommandLine, SupervisedProcess};

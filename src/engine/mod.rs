// src/engine/mod.rs

//! Orchestration engine for watchfs.
//!
//! This module ties together:
//! - the lock registry serialising actions that share lock names
//! - per-action debouncing
//! - the per-action intake and run loops
//! - the session supervisor that owns the watcher and reacts to
//!   configuration changes and shutdown

pub mod debounce;
pub mod locks;
pub mod pipeline;
pub mod session;

pub use debounce::Debouncer;
pub use locks::{LockGuards, LockRegistry};
pub use pipeline::{ActionPipeline, PipelineServices};
pub use session::{run_session, Services, SessionOutcome, RELOAD_MESSAGE};

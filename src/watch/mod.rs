// src/watch/mod.rs

//! File watching and event classification.
//!
//! This module is responsible for:
//! - Turning raw `notify` events into [`Event`]s (one per path).
//! - Evaluating [`Filter`]s and ignore globs against events.
//! - Registering watch roots directory by directory (`walk`), since the
//!   watcher itself is non-recursive.
//! - Deciding, per session, whether an event reloads the configuration,
//!   is suppressed globally, or which actions it reaches (`event_handler`).
//!
//! It does **not** run anything; the engine owns action pipelines.

pub mod event;
pub mod event_handler;
pub mod filter;
pub mod path_utils;
pub mod walk;
pub mod watcher;

pub use event::{events_from_notify, Event};
pub use event_handler::EventRouter;
pub use filter::{Filter, FilterMatch, GlobList};
pub use walk::{register_tree, DirectoryRegistrar, WalkExclusions};
pub use watcher::{DirectoryWatcher, WatchStreams};

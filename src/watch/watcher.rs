// src/watch/watcher.rs

use std::path::Path;

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::Result;
use crate::watch::walk::DirectoryRegistrar;

/// Raw notifications produced by a [`DirectoryWatcher`].
///
/// Both channels close when the watcher is dropped.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<notify::Event>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// Filesystem watcher for one session.
///
/// Directories are registered one by one (non-recursively); dropping the
/// watcher stops all watches.
pub struct DirectoryWatcher {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher").finish()
    }
}

impl DirectoryWatcher {
    pub fn new() -> Result<(Self, WatchStreams)> {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        // Called on notify's own thread. Send failures only happen once the
        // session has stopped listening.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    let _ = error_tx.send(err);
                }
            },
            Config::default(),
        )?;

        info!("file watcher created");
        Ok((Self { inner }, WatchStreams { events, errors }))
    }
}

impl DirectoryRegistrar for DirectoryWatcher {
    fn register(&mut self, dir: &Path) -> std::result::Result<(), notify::Error> {
        self.inner.watch(dir, RecursiveMode::NonRecursive)
    }
}

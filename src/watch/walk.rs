// src/watch/walk.rs

//! Recursive directory registration.
//!
//! The watcher is non-recursive, so every directory under a watch root is
//! registered individually. Excluded directories are pruned together with
//! their subtrees.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::output::{PathFailure, Reporter};
use crate::watch::filter::{Filter, GlobList};
use crate::watch::path_utils::absolute;

/// Something directories can be registered with (the live watcher, or a
/// recorder in tests).
pub trait DirectoryRegistrar {
    fn register(&mut self, dir: &Path) -> Result<(), notify::Error>;
}

/// Ignore rules applied while walking.
///
/// A path is excluded when an ignore glob matches it or when any ignore
/// filter matches at least one of its predicates on the path alone.
#[derive(Debug, Clone, Copy)]
pub struct WalkExclusions<'a> {
    pub globs: &'a GlobList,
    pub ignores: &'a [Filter],
}

impl WalkExclusions<'_> {
    pub fn excludes(&self, path: &Path) -> bool {
        self.globs.is_match(path) || self.ignores.iter().any(|f| f.evaluate(path, None).any)
    }
}

/// Register `root` and every non-excluded directory below it.
///
/// Failures are reported as `{"op", "path", "message"}` error records and
/// the affected subtree is skipped. Returns the number of directories
/// registered.
pub fn register_tree<R: DirectoryRegistrar>(
    registrar: &mut R,
    root: &Path,
    exclusions: WalkExclusions<'_>,
    reporter: &Reporter,
) -> usize {
    let mut registered = 0;
    let mut entries = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !exclusions.excludes(entry.path()));

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root);
                reporter.error(PathFailure {
                    op: "walk",
                    path: absolute(path).to_string_lossy().into_owned(),
                    message: err
                        .io_error()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| err.to_string()),
                });
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        match registrar.register(entry.path()) {
            Ok(()) => {
                registered += 1;
                debug!(dir = ?entry.path(), "watching directory");
            }
            Err(err) => {
                reporter.error(PathFailure {
                    op: "watch",
                    path: entry.path().to_string_lossy().into_owned(),
                    message: err.to_string(),
                });
                entries.skip_current_dir();
            }
        }
    }
    registered
}

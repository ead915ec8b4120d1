// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// String form of a path used for glob matching: forward slashes, with a
/// leading `./` removed so that `*.go` matches `./main.go`.
pub fn glob_candidate(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    let mut trimmed = s.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Absolute, lexically cleaned form of a path, without resolving symlinks.
///
/// `.` components are dropped and `..` pops the preceding normal component
/// (`..` directly under the root stays at the root), so `./watchfs.yaml`,
/// `watchfs.yaml` and `../proj/watchfs.yaml` (run from `proj`) compare equal.
///
/// Falls back to the path as given if the working directory is unavailable.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.into_iter().collect()
}

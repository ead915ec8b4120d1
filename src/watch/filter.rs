// src/watch/filter.rs

//! Event predicates.
//!
//! A [`Filter`] holds up to three optional predicates: an extension set, an
//! operation set and a set of shell-style path globs. Evaluating it yields a
//! [`FilterMatch`] with two views of the result:
//!
//! - `any`: at least one configured predicate is satisfied.
//! - `all`: every configured predicate is satisfied, or nothing is configured
//!   at all (vacuous match).
//!
//! Callers pick the view they need. Action filters and the global filter are
//! "soft" gates (`all || any`); ignore filters only suppress on a full match
//! (`all && any`), so a partially matching ignore filter lets events through.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::types::Operation;
use crate::watch::event::Event;
use crate::watch::path_utils::glob_candidate;

/// Result of evaluating a [`Filter`] against a path/operation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterMatch {
    pub all: bool,
    pub any: bool,
}

impl FilterMatch {
    /// Soft gate used by action and global filters.
    pub fn passes(self) -> bool {
        self.all || self.any
    }

    /// Strict gate used by ignore filters.
    pub fn is_full(self) -> bool {
        self.all && self.any
    }
}

/// Compiled event filter.
#[derive(Clone, Default)]
pub struct Filter {
    extensions: BTreeSet<String>,
    operations: BTreeSet<Operation>,
    patterns: Vec<String>,
    path_set: Option<GlobSet>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("extensions", &self.extensions)
            .field("operations", &self.operations)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl Filter {
    /// Build a filter. Extensions are normalised (trimmed, leading dot removed,
    /// lower-cased); empty entries are dropped.
    pub fn new<E, O, P>(extensions: E, operations: O, patterns: P) -> Result<Self, globset::Error>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        O: IntoIterator<Item = Operation>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let extensions: BTreeSet<String> = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        let operations: BTreeSet<Operation> = operations.into_iter().collect();
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let path_set = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(&patterns)?)
        };

        Ok(Self {
            extensions,
            operations,
            patterns,
            path_set,
        })
    }

    /// Filter with no predicates: matches everything vacuously.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn operations(&self) -> &BTreeSet<Operation> {
        &self.operations
    }

    /// True when no predicate is configured.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.operations.is_empty() && self.path_set.is_none()
    }

    /// Evaluate the filter against an event.
    pub fn matches(&self, event: &Event) -> FilterMatch {
        self.evaluate(&event.path, Some(event.op))
    }

    /// Evaluate the filter against a path, optionally with an operation.
    ///
    /// Without an operation (e.g. while walking directories) a configured
    /// operation predicate is never satisfied.
    pub fn evaluate(&self, path: &Path, op: Option<Operation>) -> FilterMatch {
        if self.is_empty() {
            return FilterMatch {
                all: true,
                any: false,
            };
        }

        let ext_ok = !self.extensions.is_empty()
            && extension_of(path).is_some_and(|ext| self.extensions.contains(&ext));
        let op_ok = !self.operations.is_empty()
            && op.is_some_and(|op| self.operations.contains(&op));
        let path_ok = self
            .path_set
            .as_ref()
            .is_some_and(|set| set.is_match(glob_candidate(path)));

        let all = (self.extensions.is_empty() || ext_ok)
            && (self.operations.is_empty() || op_ok)
            && (self.path_set.is_none() || path_ok);
        let any = ext_ok || op_ok || path_ok;

        FilterMatch { all, any }
    }
}

/// A compiled list of raw ignore globs (the top-level `ignore` key).
#[derive(Clone, Default)]
pub struct GlobList {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for GlobList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobList").field(&self.patterns).finish()
    }
}

impl GlobList {
    pub fn new(patterns: Vec<String>) -> Result<Self, globset::Error> {
        let set = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(&patterns)?)
        };
        Ok(Self { patterns, set })
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.set
            .as_ref()
            .is_some_and(|set| set.is_match(glob_candidate(path)))
    }
}

/// Normalise an extension as written in config or on the CLI.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}

/// Lower-cased extension of a path, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Build a GlobSet with shell semantics: `*` and `?` never match `/`.
fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat).literal_separator(true).build()?;
        builder.add(glob);
    }
    builder.build()
}

// src/engine/locks.rs

//! Named locks shared across actions.
//!
//! The registry maps a lock name to a mutex, created on first use and never
//! removed. Structural changes to the map are guarded by the registry's own
//! `RwLock`; the per-name mutexes are async so a waiting action only parks
//! its run loop.
//!
//! Names are always acquired in sorted order, which gives every caller the
//! same total order and rules out lock-order deadlocks between actions with
//! overlapping lock sets.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held locks. Dropping (or calling [`LockGuards::release`]) releases them all.
#[derive(Debug)]
pub struct LockGuards {
    names: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockGuards {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn release(self) {
        trace!(locks = ?self.names, "releasing locks");
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct names seen so far.
    pub fn len(&self) -> usize {
        self.read_map(|map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until every named lock is held.
    ///
    /// Duplicate names are acquired once. An empty list returns immediately.
    pub async fn acquire_all(&self, names: &[String]) -> LockGuards {
        let mut names = names.to_vec();
        names.sort();
        names.dedup();

        let mut guards = Vec::with_capacity(names.len());
        for name in &names {
            let lock = self.lock_for(name);
            guards.push(lock.lock_owned().await);
            trace!(lock = %name, "acquired lock");
        }
        LockGuards {
            names,
            _guards: guards,
        }
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.read_map(|map| map.get(name).cloned()) {
            return lock;
        }
        let mut map = match self.locks.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(name.to_string()).or_default().clone()
    }

    fn read_map<T>(&self, f: impl FnOnce(&HashMap<String, Arc<Mutex<()>>>) -> T) -> T {
        let map = match self.locks.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn locks_are_created_lazily_and_deduplicated() {
        let registry = LockRegistry::new();
        assert!(registry.is_empty());

        let guards = registry.acquire_all(&names(&["git", "db", "git"])).await;
        assert_eq!(guards.names(), &names(&["db", "git"])[..]);
        assert_eq!(registry.len(), 2);
        guards.release();

        let again = registry.acquire_all(&names(&["git"])).await;
        assert_eq!(registry.len(), 2);
        drop(again);
    }

    #[tokio::test]
    async fn held_lock_blocks_a_second_holder() {
        let registry = Arc::new(LockRegistry::new());
        let first = registry.acquire_all(&names(&["git"])).await;

        let contender = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.acquire_all(&names(&["git"])).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        first.release();
        let second = tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("second holder should acquire after release")
            .unwrap();
        assert_eq!(second.names(), &names(&["git"])[..]);
    }

    #[tokio::test]
    async fn opposite_request_orders_do_not_deadlock() {
        let registry = Arc::new(LockRegistry::new());
        let mut handles = Vec::new();
        for order in [["a", "b"], ["b", "a"]] {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let guards = registry.acquire_all(&names(&order)).await;
                    tokio::task::yield_now().await;
                    drop(guards);
                }
            }));
        }
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("lock acquisition deadlocked")
                .unwrap();
        }
    }
}

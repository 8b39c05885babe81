//! Artifact cache with at most one compilation in flight per template id.
//!
//! ## Design
//!
//! The map from id to entry sits behind a `parking_lot::RwLock`, but the lock
//! is only held to find or insert an entry, never while compiling. Each entry
//! owns a `OnceLock` holding the compilation's outcome:
//!
//! 1. The first caller for an id inserts an empty entry and runs the build
//!    closure inside `OnceLock::get_or_init`.
//! 2. Concurrent callers for the same id find that entry and block in
//!    `get_or_init` until the outcome is set. Their own closures never run.
//! 3. Later callers read the outcome without blocking.
//!
//! Outcomes are terminal: a failure is cached like a success and handed to
//! every later caller until the id is [invalidated](ArtifactCache::invalidate).
//!
//! Lookups by id take the map's read lock for the duration of one hash
//! lookup. Readers share it, and only `entry` insertion, `invalidate` and
//! `clear` take the write lock. A caller that renders one template often can
//! resolve a [`CacheHandle`] once: reads through it only touch the entry's
//! `OnceLock` and never the map lock.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// A compilation is running.
    Compiling,
    Ready,
    Failed,
}

struct Entry<T, E> {
    outcome: OnceLock<Result<T, E>>,
}

impl<T: Clone, E: Clone> Entry<T, E> {
    fn get_or_compile<F>(&self, id: &str, build: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(outcome) = self.outcome.get() {
            tracing::trace!(template_id = id, "cache hit");
            return outcome.clone();
        }
        self.outcome
            .get_or_init(|| {
                tracing::debug!(template_id = id, "cache miss");
                build()
            })
            .clone()
    }
}

impl<T, E> Entry<T, E> {
    fn state(&self) -> EntryState {
        match self.outcome.get() {
            None => EntryState::Compiling,
            Some(Ok(_)) => EntryState::Ready,
            Some(Err(_)) => EntryState::Failed,
        }
    }
}

/// Compiled outputs keyed by template id.
pub struct ArtifactCache<T, E> {
    entries: RwLock<FxHashMap<String, Arc<Entry<T, E>>>>,
}

impl<T: Clone, E: Clone> ArtifactCache<T, E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// The cached outcome for `id`, running `build` if there is none yet.
    ///
    /// `build` runs at most once per id across all threads. Callers that
    /// arrive while it runs wait for its outcome instead of building again.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_or_compile<F>(&self, id: &str, build: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.entry(id).get_or_compile(id, build)
    }

    /// Resolve the entry for `id`, inserting an empty one if needed.
    ///
    /// The handle keeps pointing at this entry after it is invalidated;
    /// resolve a new handle to observe a rebuild.
    pub fn handle(&self, id: &str) -> CacheHandle<T, E> {
        CacheHandle {
            id: id.to_string(),
            entry: self.entry(id),
        }
    }

    /// Find the entry for `id`, inserting an empty one if needed.
    fn entry(&self, id: &str) -> Arc<Entry<T, E>> {
        // Fast path: read lock only
        if let Some(entry) = self.entries.read().get(id) {
            return Arc::clone(entry);
        }

        let mut entries = self.entries.write();
        // Another thread may have inserted between the two locks
        let entry = entries.entry(id.to_string()).or_insert_with(|| {
            Arc::new(Entry {
                outcome: OnceLock::new(),
            })
        });
        Arc::clone(entry)
    }

    pub fn state(&self, id: &str) -> Option<EntryState> {
        self.entries.read().get(id).map(|entry| entry.state())
    }

    /// The cached value for `id`, if it compiled successfully.
    pub fn get(&self, id: &str) -> Option<T> {
        let entries = self.entries.read();
        match entries.get(id)?.outcome.get()? {
            Ok(value) => Some(value.clone()),
            Err(_) => None,
        }
    }

    /// Drop the entry for `id` so the next request compiles afresh.
    ///
    /// Callers already waiting on an in-flight compilation still receive its
    /// outcome. Returns whether an entry was removed.
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self.entries.write().remove(id).is_some();
        if removed {
            tracing::debug!(template_id = id, "cache entry invalidated");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// One resolved cache entry.
pub struct CacheHandle<T, E> {
    id: String,
    entry: Arc<Entry<T, E>>,
}

impl<T: Clone, E: Clone> CacheHandle<T, E> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> EntryState {
        self.entry.state()
    }

    /// Same contract as [`ArtifactCache::get_or_compile`], without the map lookup.
    pub fn get_or_compile<F>(&self, build: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.entry.get_or_compile(&self.id, build)
    }
}

impl<T, E> Clone for CacheHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            entry: Arc::clone(&self.entry),
        }
    }
}

impl<T, E> fmt::Debug for CacheHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("id", &self.id)
            .field("state", &self.entry.state())
            .finish()
    }
}

impl<T: Clone, E: Clone> Default for ArtifactCache<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for ArtifactCache<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut map = f.debug_map();
        for (id, entry) in entries.iter() {
            map.entry(id, &entry.state());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    use super::*;

    type Cache = ArtifactCache<Arc<String>, String>;

    #[test]
    fn builds_once_and_then_hits() {
        let cache = Cache::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new("artifact".to_string()))
        };

        let first = cache.get_or_compile("t", build).unwrap();
        let second = cache.get_or_compile("t", build).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state("t"), Some(EntryState::Ready));
        assert_eq!(cache.state("other"), None);
    }

    #[test]
    fn failures_are_terminal() {
        let cache = Cache::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            Err("broken".to_string())
        };

        assert_eq!(cache.get_or_compile("t", build), Err("broken".to_string()));
        assert_eq!(cache.get_or_compile("t", build), Err("broken".to_string()));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state("t"), Some(EntryState::Failed));
        assert_eq!(cache.get("t"), None);
    }

    #[test]
    fn invalidate_forces_a_rebuild() {
        let cache = Cache::new();
        cache.get_or_compile("t", || Err("v1".to_string())).unwrap_err();
        assert!(cache.invalidate("t"));
        assert!(!cache.invalidate("t"));
        let value = cache.get_or_compile("t", || Ok(Arc::new("v2".to_string())));
        assert_eq!(value.unwrap().as_str(), "v2");

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_share_one_build() {
        const THREADS: usize = 8;
        let cache = Cache::new();
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);
        let (cache, builds, barrier) = (&cache, &builds, &barrier);

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        cache.get_or_compile("shared", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(Arc::new("done".to_string()))
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[test]
    fn handles_read_without_the_map() {
        let cache = Cache::new();
        let handle = cache.handle("t");
        assert_eq!(handle.state(), EntryState::Compiling);

        let built = handle.get_or_compile(|| Ok(Arc::new("v1".to_string()))).unwrap();
        let looked_up = cache.get_or_compile("t", || unreachable!()).unwrap();
        assert!(Arc::ptr_eq(&built, &looked_up));

        // Holding the map's write lock does not block reads through the handle.
        let guard = cache.entries.write();
        let read = handle.get_or_compile(|| unreachable!()).unwrap();
        drop(guard);
        assert!(Arc::ptr_eq(&built, &read));

        assert!(cache.invalidate("t"));
        assert_eq!(handle.state(), EntryState::Ready);
        assert_eq!(cache.handle("t").state(), EntryState::Compiling);
    }

    #[test]
    fn other_ids_are_not_blocked_by_a_slow_build() {
        let owned = Cache::new();
        let cache = &owned;
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|s| {
            s.spawn(move || {
                cache.get_or_compile("slow", || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(Arc::new("slow".to_string()))
                })
            });

            started_rx.recv().unwrap();
            assert_eq!(cache.state("slow"), Some(EntryState::Compiling));
            let fast = cache.get_or_compile("fast", || Ok(Arc::new("fast".to_string())));
            assert_eq!(fast.unwrap().as_str(), "fast");
            release_tx.send(()).unwrap();
        });

        assert_eq!(cache.state("slow"), Some(EntryState::Ready));
        assert_eq!(cache.len(), 2);
    }
}

//! Named async mutexes.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Once the table holds this many entries, idle ones are pruned on access.
const PRUNE_THRESHOLD: usize = 1024;

/// A table of async mutexes addressed by string keys.
///
/// Holding the guard for a key serialises every other task locking the same
/// key while leaving other keys unaffected. Entries nobody holds a handle to
/// are dropped lazily once the table grows.
#[derive(Debug, Default, Clone)]
pub struct KeyedLocks {
    inner: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self { Self::default() }

    /// Returns the shared mutex for `key`, creating it on first use.
    pub fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        let mut table = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if table.len() >= PRUNE_THRESHOLD {
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        table
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Locks `key`, waiting for any current holder.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        trace!("Acquiring keyed lock: {}", key);
        self.handle(key).lock_owned().await
    }

    /// Locks several keys in a canonical (sorted, deduplicated) order so that
    /// concurrent callers cannot deadlock.
    pub async fn lock_many<S: AsRef<str>>(&self, keys: &[S]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[tokio::test]
    async fn test_same_key_is_serialised() {
        let locks = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0 .. 8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock("product-1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_lock_many_dedups_keys() {
        let locks = KeyedLocks::new();
        let guards = locks.lock_many(&["b", "a", "b"]).await;
        assert_eq!(guards.len(), 2);
        assert_eq!(locks.len(), 2);
    }
}

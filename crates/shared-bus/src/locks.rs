//! # Keyed Locks
//!
//! Serializes operations on one entity (a vendor, an order) while letting
//! operations on different entities run concurrently.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per key, created on first use and evicted once the last
/// holder or waiter lets go.
///
/// The guard owns its mutex guard, so it can be held across `.await` points
/// such as a store write followed by a publish.
pub struct KeyedLocks<K: Eq + Hash + Clone> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &K) -> KeyedGuard<'_, K> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let mut guard = KeyedGuard {
            table: &self.locks,
            key: key.clone(),
            held: None,
        };
        guard.held = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key; releases and evicts the entry on drop.
pub struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    table: &'a DashMap<K, Arc<Mutex<()>>>,
    key: K,
    held: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.held.take());
        // Waiters hold their own clone of the Arc, so a contended key stays.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let guard = locks.lock(&"v1".to_string()).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&"v1".to_string()).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::<String>::new();
        let _a = locks.lock(&"v1".to_string()).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.lock(&"v2".to_string()))
            .await
            .expect("distinct keys must not contend");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_are_evicted() {
        let locks = KeyedLocks::<u32>::new();
        for key in 0..10_000 {
            let _guard = locks.lock(&key).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_contended_key_survives_first_release() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let guard = locks.lock(&"o1".to_string()).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&"o1".to_string()).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                locks.len()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);
        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_wait_is_evicted() {
        let locks = KeyedLocks::<String>::new();
        let guard = locks.lock(&"v1".to_string()).await;

        let waited =
            tokio::time::timeout(Duration::from_millis(20), locks.lock(&"v1".to_string())).await;
        assert!(waited.is_err());

        drop(guard);
        assert!(locks.is_empty());
    }
}

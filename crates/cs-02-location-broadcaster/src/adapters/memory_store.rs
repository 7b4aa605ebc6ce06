//! In-process location store.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{VendorId, VendorLocation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::BroadcastError;
use crate::ports::LocationStore;

#[derive(Default)]
pub struct InMemoryLocationStore {
    records: RwLock<HashMap<VendorId, VendorLocation>>,
    fail_writes: AtomicBool,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail, for failure-path tests.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn save(&self, location: VendorLocation) -> Result<(), BroadcastError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BroadcastError::Persistence("writes disabled".into()));
        }
        self.records
            .write()
            .insert(location.vendor_id.clone(), location);
        Ok(())
    }

    async fn load(&self, vendor_id: &VendorId) -> Result<Option<VendorLocation>, BroadcastError> {
        Ok(self.records.read().get(vendor_id).cloned())
    }

    async fn all(&self) -> Result<Vec<VendorLocation>, BroadcastError> {
        let mut all: Vec<VendorLocation> = self.records.read().values().cloned().collect();
        all.sort_by(|a, b| a.vendor_id.cmp(&b.vendor_id));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, lat: f64) -> VendorLocation {
        VendorLocation {
            vendor_id: VendorId::new(id),
            lat,
            lng: 77.59,
            current_stop: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = InMemoryLocationStore::new();
        store.save(record("v1", 12.90)).await.unwrap();
        store.save(record("v1", 12.95)).await.unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.load(&VendorId::new("v1")).await.unwrap().unwrap();
        assert_eq!(loaded.lat, 12.95);
    }

    #[tokio::test]
    async fn test_failing_writes_leave_record() {
        let store = InMemoryLocationStore::new();
        store.save(record("v1", 12.90)).await.unwrap();
        store.fail_writes(true);

        let err = store.save(record("v1", 13.0)).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Persistence(_)));
        let loaded = store.load(&VendorId::new("v1")).await.unwrap().unwrap();
        assert_eq!(loaded.lat, 12.90);
    }

    #[test]
    fn test_all_sorted_by_vendor() {
        let store = InMemoryLocationStore::new();
        tokio_test::block_on(async {
            store.save(record("v2", 12.91)).await.unwrap();
            store.save(record("v1", 12.90)).await.unwrap();
        });

        let ids: Vec<String> = tokio_test::block_on(store.all())
            .unwrap()
            .into_iter()
            .map(|location| location.vendor_id.to_string())
            .collect();
        assert_eq!(ids, ["v1", "v2"]);
    }
}

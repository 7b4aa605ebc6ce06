//! Outbound port: vendor location persistence.

use async_trait::async_trait;
use shared_types::{VendorId, VendorLocation};

use crate::domain::BroadcastError;

/// Keyed store of one location record per vendor.
///
/// `save` overwrites; there is no history.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn save(&self, location: VendorLocation) -> Result<(), BroadcastError>;

    async fn load(&self, vendor_id: &VendorId) -> Result<Option<VendorLocation>, BroadcastError>;

    async fn all(&self) -> Result<Vec<VendorLocation>, BroadcastError>;
}

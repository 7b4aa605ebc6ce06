//! Inbound port of the Location Broadcaster.

use async_trait::async_trait;
use shared_types::{Identity, VendorId, VendorLocation, VendorStatus};

use crate::domain::{BroadcastError, LocationUpdate, TrackedVendor};

/// Vendor position API.
///
/// The broadcaster is the only mutator of vendor location records; every
/// other component reads through this trait.
#[async_trait]
pub trait LocationApi: Send + Sync {
    /// Overwrite the vendor's last-known location and announce the move on
    /// `vendor-feed:global` and `vendor:<id>`.
    ///
    /// Fails with `Unauthorized` unless `actor` is that vendor.
    async fn update_location(
        &self,
        actor: &Identity,
        update: LocationUpdate,
    ) -> Result<VendorLocation, BroadcastError>;

    /// Flip the vendor's online flag and announce it on the same channels.
    /// The last-known location is kept.
    async fn set_online_status(
        &self,
        actor: &Identity,
        vendor_id: &VendorId,
        is_online: bool,
    ) -> Result<VendorStatus, BroadcastError>;

    async fn location(&self, vendor_id: &VendorId) -> Result<Option<VendorLocation>, BroadcastError>;

    /// Every known vendor location with its online flag, sorted by vendor id.
    async fn all_locations(&self) -> Result<Vec<TrackedVendor>, BroadcastError>;

    fn is_online(&self, vendor_id: &VendorId) -> bool;
}

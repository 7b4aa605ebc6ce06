//! Outbound port: order persistence.

use async_trait::async_trait;
use shared_types::{CustomerId, Order, OrderId, VendorId};

use crate::domain::OrderError;

/// Durable order records.
///
/// Implementations return `OrderError::Persistence` for any backend failure.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert or overwrite the record keyed by `order.order_id`.
    async fn save(&self, order: &Order) -> Result<(), OrderError>;

    async fn load(&self, order_id: &OrderId) -> Result<Option<Order>, OrderError>;

    async fn for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Order>, OrderError>;

    async fn for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, OrderError>;
}

//! Inbound port of the Order Synchronizer.

use async_trait::async_trait;
use shared_types::{CustomerId, Identity, Order, OrderId, OrderStatus, VendorId};

use crate::domain::{NewOrder, OrderError, OrderPlacement};

/// Order lifecycle API.
///
/// Orders change only through `create` and `transition`; everything else
/// is read-only.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Place a new `pending` order on behalf of the acting customer.
    ///
    /// A store failure does not fail the call: the order comes back as
    /// [`OrderPlacement::Local`] and no `new_order` event is sent.
    async fn create(&self, actor: &Identity, request: NewOrder) -> Result<OrderPlacement, OrderError>;

    /// Move an order along the state graph, persist it, then notify the
    /// customer's room with `order_status_update`.
    async fn transition(
        &self,
        order_id: &OrderId,
        new_status: OrderStatus,
        actor: &Identity,
    ) -> Result<Order, OrderError>;

    async fn get(&self, order_id: &OrderId) -> Result<Order, OrderError>;

    async fn orders_for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Order>, OrderError>;

    async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, OrderError>;
}

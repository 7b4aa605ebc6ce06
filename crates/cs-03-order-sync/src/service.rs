//! Order Synchronizer Service

use async_trait::async_trait;
use shared_bus::{EventPublisher, KeyedLocks};
use shared_types::{
    Channel, CustomerId, Identity, Order, OrderId, OrderStatus, OrderStatusUpdate, ServerEvent,
    VendorId,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{is_valid_transition, NewOrder, OrderError, OrderPlacement};
use crate::ports::{OrderApi, OrderStore};

/// Sole mutator of order records.
pub struct OrderSynchronizer<S: OrderStore> {
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    locks: KeyedLocks<OrderId>,
}

impl<S: OrderStore> OrderSynchronizer<S> {
    pub fn new(store: Arc<S>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The owning vendor may take any edge; the owning customer may only
    /// cancel a pending order.
    fn authorize(
        order: &Order,
        new_status: OrderStatus,
        actor: &Identity,
    ) -> Result<(), OrderError> {
        let vendor_owned = actor.is_vendor(&order.vendor_id);
        let customer_cancel = actor.is_customer(&order.customer_id)
            && order.status == OrderStatus::Pending
            && new_status == OrderStatus::Cancelled;

        if vendor_owned || customer_cancel {
            return Ok(());
        }
        warn!(
            actor = %actor,
            order_id = %order.order_id,
            from = %order.status,
            to = %new_status,
            "Rejected order mutation"
        );
        Err(OrderError::Unauthorized {
            actor: actor.clone(),
            order_id: order.order_id,
        })
    }
}

#[async_trait]
impl<S: OrderStore + 'static> OrderApi for OrderSynchronizer<S> {
    async fn create(&self, actor: &Identity, request: NewOrder) -> Result<OrderPlacement, OrderError> {
        let customer_id = actor
            .as_customer()
            .cloned()
            .ok_or_else(|| OrderError::NotACustomer(actor.clone()))?;
        let total = request.validated_total()?;
        let order = request.into_order(customer_id, total);

        if let Err(err) = self.store.save(&order).await {
            warn!(
                order_id = %order.order_id,
                vendor_id = %order.vendor_id,
                error = %err,
                "Order not persisted, returning local order"
            );
            return Ok(OrderPlacement::Local(order));
        }

        let report = self
            .publisher
            .publish(
                &Channel::vendor_orders(&order.vendor_id),
                ServerEvent::NewOrder(order.clone()),
            )
            .await;

        info!(
            order_id = %order.order_id,
            vendor_id = %order.vendor_id,
            customer_id = %order.customer_id,
            total = order.total,
            delivered = report.delivered,
            "Order placed"
        );
        Ok(OrderPlacement::Persisted(order))
    }

    async fn transition(
        &self,
        order_id: &OrderId,
        new_status: OrderStatus,
        actor: &Identity,
    ) -> Result<Order, OrderError> {
        let _guard = self.locks.lock(order_id).await;

        let current = self
            .store
            .load(order_id)
            .await?
            .ok_or(OrderError::NotFound(*order_id))?;

        Self::authorize(&current, new_status, actor)?;

        if !is_valid_transition(current.status, new_status) {
            debug!(order_id = %order_id, from = %current.status, to = %new_status, "Invalid transition");
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        let updated = Order {
            status: new_status,
            ..current
        };
        if let Err(err) = self.store.save(&updated).await {
            error!(order_id = %order_id, to = %new_status, error = %err, "Failed to persist transition");
            return Err(err);
        }

        let report = self
            .publisher
            .publish(
                &Channel::customer(&updated.customer_id),
                ServerEvent::OrderStatusUpdate(OrderStatusUpdate {
                    order_id: *order_id,
                    status: new_status,
                }),
            )
            .await;

        info!(
            order_id = %order_id,
            status = %new_status,
            delivered = report.delivered,
            "Order status updated"
        );
        Ok(updated)
    }

    async fn get(&self, order_id: &OrderId) -> Result<Order, OrderError> {
        self.store
            .load(order_id)
            .await?
            .ok_or(OrderError::NotFound(*order_id))
    }

    async fn orders_for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Order>, OrderError> {
        self.store.for_vendor(vendor_id).await
    }

    async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, OrderError> {
        self.store.for_customer(customer_id).await
    }
}

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{CustomerId, Order, OrderId, VendorId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::OrderError;
use crate::ports::OrderStore;

/// Hash-map backed store with a switch to reject writes.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    fail_writes: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    fn select(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|order| predicate(order))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        orders
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> Result<(), OrderError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(OrderError::Persistence("writes disabled".into()));
        }
        self.orders.write().insert(order.order_id, order.clone());
        Ok(())
    }

    async fn load(&self, order_id: &OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.read().get(order_id).cloned())
    }

    async fn for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Order>, OrderError> {
        Ok(self.select(|order| &order.vendor_id == vendor_id))
    }

    async fn for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, OrderError> {
        Ok(self.select(|order| &order.customer_id == customer_id))
    }
}

/// A store whose backend is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingOrderStore;

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn save(&self, _order: &Order) -> Result<(), OrderError> {
        Err(OrderError::Persistence("backend unavailable".into()))
    }

    async fn load(&self, _order_id: &OrderId) -> Result<Option<Order>, OrderError> {
        Err(OrderError::Persistence("backend unavailable".into()))
    }

    async fn for_vendor(&self, _vendor_id: &VendorId) -> Result<Vec<Order>, OrderError> {
        Err(OrderError::Persistence("backend unavailable".into()))
    }

    async fn for_customer(&self, _customer_id: &CustomerId) -> Result<Vec<Order>, OrderError> {
        Err(OrderError::Persistence("backend unavailable".into()))
    }
}

//! Order placement request and result.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{round2, CustomerId, Order, OrderId, OrderItem, OrderStatus, VendorId};

use crate::domain::errors::OrderError;

/// Largest accepted difference between a client-computed and the server total.
const TOTAL_TOLERANCE: f64 = 0.01;

/// A customer's order request as received from the placement endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub vendor_id: VendorId,
    pub items: Vec<OrderItem>,
    /// Total as computed by the client, checked against the items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl NewOrder {
    pub fn new(vendor_id: VendorId, items: Vec<OrderItem>) -> Self {
        Self {
            vendor_id,
            items,
            total: None,
        }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }

    /// Validate the request and compute its total, rounded to cents.
    pub fn validated_total(&self) -> Result<f64, OrderError> {
        if self.vendor_id.as_str().is_empty() {
            return Err(OrderError::InvalidRequest("vendorId is empty".into()));
        }
        if self.items.is_empty() {
            return Err(OrderError::InvalidRequest("order has no items".into()));
        }
        for item in &self.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidRequest(format!(
                    "item '{}' has zero quantity",
                    item.name
                )));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(OrderError::InvalidRequest(format!(
                    "item '{}' has invalid price {}",
                    item.name, item.price
                )));
            }
        }

        let total = round2(self.items.iter().map(OrderItem::line_total).sum());
        if let Some(claimed) = self.total {
            if !claimed.is_finite() || (claimed - total).abs() > TOTAL_TOLERANCE {
                return Err(OrderError::InvalidRequest(format!(
                    "total {claimed} does not match items ({total})"
                )));
            }
        }
        Ok(total)
    }

    /// Build the pending order for `customer_id`.
    pub(crate) fn into_order(self, customer_id: CustomerId, total: f64) -> Order {
        Order {
            order_id: OrderId::new(),
            vendor_id: self.vendor_id,
            customer_id,
            items: self.items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of order creation.
///
/// `Local` means the store rejected the write: the order is valid but exists
/// only in the caller's hands and was not announced to the vendor.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlacement {
    Persisted(Order),
    Local(Order),
}

impl OrderPlacement {
    pub fn order(&self) -> &Order {
        match self {
            OrderPlacement::Persisted(order) | OrderPlacement::Local(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            OrderPlacement::Persisted(order) | OrderPlacement::Local(order) => order,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, OrderPlacement::Persisted(_))
    }
}

//! Order Synchronizer error types.

use shared_types::{ErrorKind, Identity, OrderId, OrderStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("invalid order request: {0}")]
    InvalidRequest(String),

    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{actor} may not modify order {order_id}")]
    Unauthorized { actor: Identity, order_id: OrderId },

    #[error("only customers can place orders, got {0}")]
    NotACustomer(Identity),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order store failure: {0}")]
    Persistence(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::Unauthorized { .. } | OrderError::NotACustomer(_) => {
                ErrorKind::UnauthorizedMutation
            }
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}

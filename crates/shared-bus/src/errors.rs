//! # Router Errors

use shared_types::{ConnectionId, ErrorKind};
use thiserror::Error;

/// Why a single delivery to one connection failed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The mailbox stayed full for the whole delivery timeout.
    #[error("delivery timed out")]
    Timeout,
    /// The receiving side of the mailbox is gone (connection closing).
    #[error("connection closed")]
    Closed,
}

/// Errors from router operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The connection was never registered or has already been removed.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Direct delivery to one connection failed.
    #[error("delivery to {connection_id} failed: {reason}")]
    Delivery {
        connection_id: ConnectionId,
        reason: DeliveryError,
    },
}

impl RouterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::UnknownConnection(_) => ErrorKind::NotFound,
            RouterError::Delivery { .. } => ErrorKind::DeliveryTimeout,
        }
    }
}

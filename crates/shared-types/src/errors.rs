//! # Error Taxonomy
//!
//! Every subsystem error maps onto one of these kinds so the connection
//! supervisor can answer clients uniformly.
//!
//! | Kind | Scope | Effect |
//! |------|-------|--------|
//! | `InvalidCoordinate` | caller | rejected, no state change, no publish |
//! | `InvalidTransition` | caller | rejected, no state change, no publish |
//! | `UnauthorizedMutation` | caller | rejected, no state change, no publish |
//! | `DeliveryTimeout` | one subscriber | subscriber dropped, publish succeeds |
//! | `PersistenceFailure` | triggering operation | operation fails, process keeps running |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failure, independent of the subsystem that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidCoordinate,
    InvalidTransition,
    UnauthorizedMutation,
    DeliveryTimeout,
    PersistenceFailure,
    /// No credential, or a credential that does not resolve.
    Unauthenticated,
    /// The referenced order or vendor does not exist.
    NotFound,
    /// Malformed request payload.
    InvalidRequest,
    /// Inbound message rate exceeded.
    RateLimited,
}

impl ErrorKind {
    /// Wire code sent to clients in `error` events and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCoordinate => "INVALID_COORDINATE",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::UnauthorizedMutation => "UNAUTHORIZED_MUTATION",
            ErrorKind::DeliveryTimeout => "DELIVERY_TIMEOUT",
            ErrorKind::PersistenceFailure => "PERSISTENCE_FAILURE",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::RateLimited => "RATE_LIMITED",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            ErrorKind::DeliveryTimeout | ErrorKind::PersistenceFailure
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

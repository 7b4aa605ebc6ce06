//! Supervisor errors and their client-facing form.
//!
//! Every failure is reported to a client as `{code, message}`, either as an
//! `error` event on the socket or as an HTTP JSON body.
//!
//! | Kind | HTTP status |
//! |------|-------------|
//! | `INVALID_COORDINATE`, `INVALID_REQUEST` | 400 |
//! | `UNAUTHENTICATED` | 401 |
//! | `UNAUTHORIZED_MUTATION` | 403 |
//! | `NOT_FOUND` | 404 |
//! | `INVALID_TRANSITION` | 409 |
//! | `RATE_LIMITED` | 429 |
//! | `PERSISTENCE_FAILURE`, `DELIVERY_TIMEOUT` | 503 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cs_01_geo_engine::GeoError;
use cs_02_location_broadcaster::BroadcastError;
use cs_03_order_sync::OrderError;
use serde::{Deserialize, Serialize};
use shared_bus::RouterError;
use shared_types::{Channel, ErrorKind, Identity, Role, ServerEvent};
use thiserror::Error;

use crate::domain::config::ConfigError;

/// Supervisor error type
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Location(#[from] BroadcastError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Router(#[from] RouterError),

    /// No identity has been established yet
    #[error("not authenticated")]
    Unauthenticated,

    /// The credential did not resolve to an identity
    #[error("invalid credential")]
    InvalidCredential,

    #[error("connection is already authenticated as {0}")]
    AlreadyAuthenticated(Identity),

    #[error("{actor} may not join {channel}")]
    ForbiddenRoom { actor: Identity, channel: Channel },

    #[error("{actor} may not act for {target}")]
    ForbiddenTarget { actor: Identity, target: String },

    #[error("this action requires a {0} identity")]
    WrongRole(Role),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("message of {size} bytes exceeds the {max} byte limit")]
    MessageTooLarge { size: usize, max: usize },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("connection is closed")]
    Closed,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::Geo(err) => err.kind(),
            SupervisorError::Location(err) => err.kind(),
            SupervisorError::Order(err) => err.kind(),
            SupervisorError::Router(err) => err.kind(),
            SupervisorError::Unauthenticated | SupervisorError::InvalidCredential => {
                ErrorKind::Unauthenticated
            }
            SupervisorError::AlreadyAuthenticated(_)
            | SupervisorError::ForbiddenRoom { .. }
            | SupervisorError::ForbiddenTarget { .. }
            | SupervisorError::WrongRole(_) => ErrorKind::UnauthorizedMutation,
            SupervisorError::Malformed(_) | SupervisorError::MessageTooLarge { .. } => {
                ErrorKind::InvalidRequest
            }
            SupervisorError::RateLimited => ErrorKind::RateLimited,
            SupervisorError::Closed => ErrorKind::NotFound,
            SupervisorError::Config(_) | SupervisorError::Io(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// Client-facing error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.code)
    }

    /// The same error as a socket event.
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.code, self.message.clone())
    }
}

impl From<&SupervisorError> for ApiError {
    fn from(err: &SupervisorError) -> Self {
        let kind = err.kind();
        // Server-side failures carry no internal detail.
        let message = if kind.is_caller_error() {
            err.to_string()
        } else {
            match kind {
                ErrorKind::PersistenceFailure => "storage temporarily unavailable".to_string(),
                _ => "temporarily unavailable".to_string(),
            }
        };
        Self::new(kind, message)
    }
}

impl From<SupervisorError> for ApiError {
    fn from(err: SupervisorError) -> Self {
        Self::from(&err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidCoordinate | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::UnauthorizedMutation => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::PersistenceFailure | ErrorKind::DeliveryTimeout => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl IntoResponse for SupervisorError {
    fn into_response(self) -> Response {
        ApiError::from(&self).into_response()
    }
}

//! HTTP surface: collaborator endpoints and the WebSocket upgrade.
//!
//! | Method | Path | Caller |
//! |--------|------|--------|
//! | GET | `/health` | anyone |
//! | GET | `/stats` | anyone |
//! | POST | `/orders` | customer bearer |
//! | GET | `/orders/:id` | bearer, party to the order |
//! | POST | `/orders/:id/status` | bearer, vendor (or customer cancelling) |
//! | POST | `/vendor/location` | vendor bearer |
//! | GET | `/vendors/nearby` | anyone |
//! | GET | `/ws` | bearer header, `token` query, or `authenticate` event |

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{DefaultBodyLimit, FromRequestParts, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cs_01_geo_engine::validate;
use cs_02_location_broadcaster::LocationUpdate;
use cs_03_order_sync::{NewOrder, OrderPlacement};
use serde::Deserialize;
use shared_types::{Identity, LocationUpdatePayload, OrderId, OrderStatus, Role};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::domain::SupervisorError;
use crate::supervisor::ConnectionSupervisor;
use crate::ws::WebSocketHandler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<ConnectionSupervisor>,
}

/// Build the full router with its middleware stack.
pub fn router(supervisor: Arc<ConnectionSupervisor>) -> Router {
    let http = supervisor.config().http.clone();
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(http.request_timeout));

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", post(update_order_status))
        .route("/vendor/location", post(update_vendor_location))
        .route("/vendors/nearby", get(nearby_vendors))
        .route("/ws", get(upgrade))
        .layer(DefaultBodyLimit::max(http.max_body_size))
        .layer(middleware)
        .with_state(AppState { supervisor })
}

/// The identity behind an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = SupervisorError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(SupervisorError::Unauthenticated)?;
        let identity = state.supervisor.resolve(token).await?;
        Ok(Caller(identity))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn parse_order_id(raw: &str) -> Result<OrderId, SupervisorError> {
    OrderId::parse(raw).map_err(|_| SupervisorError::Malformed(format!("invalid order id '{raw}'")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, SupervisorError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| SupervisorError::Malformed(rejection.body_text()))
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.supervisor.stats())
}

/// `201` when the order was stored and announced, `202` when it exists only
/// in the response because storage was unavailable.
async fn create_order(
    State(state): State<AppState>,
    Caller(identity): Caller,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<Response, SupervisorError> {
    let request = body(payload)?;
    let placement = state.supervisor.orders().create(&identity, request).await?;

    let (status, persisted) = match &placement {
        OrderPlacement::Persisted(_) => (StatusCode::CREATED, true),
        OrderPlacement::Local(_) => (StatusCode::ACCEPTED, false),
    };
    info!(
        order_id = %placement.order().order_id,
        customer = %identity,
        persisted = persisted,
        "Order placed over HTTP"
    );
    let body = serde_json::json!({
        "persisted": persisted,
        "order": placement.into_order(),
    });
    Ok((status, Json(body)).into_response())
}

async fn get_order(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Response, SupervisorError> {
    let order_id = parse_order_id(&id)?;
    let order = state.supervisor.orders().get(&order_id).await?;
    if !identity.is_customer(&order.customer_id) && !identity.is_vendor(&order.vendor_id) {
        return Err(SupervisorError::ForbiddenTarget {
            actor: identity,
            target: format!("order {order_id}"),
        });
    }
    Ok(Json(order).into_response())
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn update_order_status(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Response, SupervisorError> {
    let order_id = parse_order_id(&id)?;
    let StatusBody { status } = body(payload)?;
    let order = state
        .supervisor
        .orders()
        .transition(&order_id, status, &identity)
        .await?;
    Ok(Json(order).into_response())
}

async fn update_vendor_location(
    State(state): State<AppState>,
    Caller(identity): Caller,
    payload: Result<Json<LocationUpdatePayload>, JsonRejection>,
) -> Result<Response, SupervisorError> {
    let vendor_id = identity
        .as_vendor()
        .cloned()
        .ok_or(SupervisorError::WrongRole(Role::Vendor))?;
    let payload = body(payload)?;
    let update = LocationUpdate {
        vendor_id,
        lat: payload.lat,
        lng: payload.lng,
        current_stop: payload.current_stop,
    };
    let location = state
        .supervisor
        .locations()
        .update_location(&identity, update)
        .await?;
    Ok(Json(location).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
    #[serde(default)]
    online_only: bool,
}

async fn nearby_vendors(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Response, SupervisorError> {
    let Query(query) = query.map_err(|rejection| SupervisorError::Malformed(rejection.body_text()))?;
    let origin = validate(query.lat, query.lng)?;
    let nearby = state
        .supervisor
        .nearby(origin, query.radius_km, query.online_only)
        .await?;
    Ok(Json(nearby).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct UpgradeQuery {
    token: Option<String>,
}

async fn upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UpgradeQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or(query.token);
    debug!(with_token = token.is_some(), "WebSocket upgrade requested");

    let handler = WebSocketHandler::new(state.supervisor).with_token(token);
    ws.on_upgrade(move |socket| handler.handle(socket))
}

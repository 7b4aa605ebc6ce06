//! # Wire Events
//!
//! Events exchanged with connected clients over the live connection.
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//!
//! ## Inbound (client → core)
//!
//! | Event | Payload | Allowed role |
//! |-------|---------|--------------|
//! | `authenticate` | `{token}` | any, before authentication |
//! | `join_vendor_room` | `vendorId` | owning vendor |
//! | `join_customer_room` | `customerId` | owning customer |
//! | `customer_location` | `{customerId, lat, lng}` | owning customer |
//! | `get_all_vendor_locations` | none | any |
//! | `update_location` | `{lat, lng, currentStop?}` | vendor |
//! | `set_online_status` | `{isOnline}` | vendor |
//! | `update_order_status` | `{orderId, status}` | order parties |
//!
//! ## Outbound (core → client)
//!
//! `authenticated`, `vendor_moved`, `vendor_status_changed`,
//! `all_vendor_locations`, `nearby_vendors`, `new_order`,
//! `order_status_update`, `error`.

use crate::entities::{
    ConnectionId, CustomerId, Order, OrderId, OrderStatus, Role, VendorId, VendorLocation,
};
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND
// =============================================================================

/// Events a client may send over its connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Authenticate(AuthenticatePayload),
    JoinVendorRoom(VendorId),
    JoinCustomerRoom(CustomerId),
    CustomerLocation(CustomerLocationPayload),
    GetAllVendorLocations,
    UpdateLocation(LocationUpdatePayload),
    SetOnlineStatus(OnlineStatusPayload),
    UpdateOrderStatus(OrderStatusUpdate),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Authenticate(_) => "authenticate",
            ClientEvent::JoinVendorRoom(_) => "join_vendor_room",
            ClientEvent::JoinCustomerRoom(_) => "join_customer_room",
            ClientEvent::CustomerLocation(_) => "customer_location",
            ClientEvent::GetAllVendorLocations => "get_all_vendor_locations",
            ClientEvent::UpdateLocation(_) => "update_location",
            ClientEvent::SetOnlineStatus(_) => "set_online_status",
            ClientEvent::UpdateOrderStatus(_) => "update_order_status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatePayload {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLocationPayload {
    pub customer_id: CustomerId,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdatePayload {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub current_stop: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineStatusPayload {
    pub is_online: bool,
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Events the core pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Authenticated(SessionInfo),
    VendorMoved(VendorPosition),
    VendorStatusChanged(VendorStatus),
    AllVendorLocations(Vec<VendorPosition>),
    NearbyVendors(Vec<NearbyVendor>),
    NewOrder(Order),
    OrderStatusUpdate(OrderStatusUpdate),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Authenticated(_) => "authenticated",
            ServerEvent::VendorMoved(_) => "vendor_moved",
            ServerEvent::VendorStatusChanged(_) => "vendor_status_changed",
            ServerEvent::AllVendorLocations(_) => "all_vendor_locations",
            ServerEvent::NearbyVendors(_) => "nearby_vendors",
            ServerEvent::NewOrder(_) => "new_order",
            ServerEvent::OrderStatusUpdate(_) => "order_status_update",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            code: kind,
            message: message.into(),
        })
    }
}

/// Sent once a connection has resolved its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub connection_id: ConnectionId,
    pub role: Role,
    pub id: String,
}

/// Position of a vendor as broadcast to customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPosition {
    pub vendor_id: VendorId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub current_stop: Option<String>,
}

impl From<&VendorLocation> for VendorPosition {
    fn from(location: &VendorLocation) -> Self {
        Self {
            vendor_id: location.vendor_id.clone(),
            lat: location.lat,
            lng: location.lng,
            current_stop: location.current_stop.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorStatus {
    pub vendor_id: VendorId,
    pub is_online: bool,
}

/// One entry of a discovery result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyVendor {
    pub vendor_id: VendorId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub current_stop: Option<String>,
    pub distance_km: f64,
}

/// Order status change, used both inbound (request) and outbound (notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorKind,
    pub message: String,
}

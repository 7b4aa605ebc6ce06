//! # Connection Supervisor
//!
//! Owns the lifecycle of every live connection: identity resolution, the
//! automatic room subscriptions implied by role, inbound event dispatch and
//! the exactly-once cleanup on close.
//!
//! Transport-agnostic: the WebSocket handler feeds it text frames and drains
//! the connection's mailbox, and tests drive it directly.

use cs_01_geo_engine::{validate, within_radius};
use cs_02_location_broadcaster::{LocationApi, LocationUpdate};
use cs_03_order_sync::OrderApi;
use serde::Serialize;
use shared_bus::{connection_channel, ConnectionPhase, Mailbox, PresenceRegistry, RoomRouter};
use shared_types::{
    Channel, ClientEvent, ConnectionId, Coordinates, Identity, NearbyVendor, Role, ServerEvent,
    SessionInfo, VendorId, VendorPosition,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{ApiError, Session, SupervisorConfig, SupervisorError};
use crate::metrics::{MetricsSnapshot, SupervisorMetrics};
use crate::ports::IdentityResolver;

/// Counters reported by `/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorStats {
    pub connections: usize,
    pub channels: usize,
    pub subscriptions: usize,
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub online_vendors: usize,
    pub online_customers: usize,
    pub sessions: MetricsSnapshot,
}

/// Collaborators the supervisor dispatches into.
pub struct SupervisorDeps {
    pub router: Arc<RoomRouter>,
    pub presence: Arc<PresenceRegistry>,
    pub locations: Arc<dyn LocationApi>,
    pub orders: Arc<dyn OrderApi>,
    pub resolver: Arc<dyn IdentityResolver>,
}

pub struct ConnectionSupervisor {
    router: Arc<RoomRouter>,
    presence: Arc<PresenceRegistry>,
    locations: Arc<dyn LocationApi>,
    orders: Arc<dyn OrderApi>,
    resolver: Arc<dyn IdentityResolver>,
    config: SupervisorConfig,
    metrics: SupervisorMetrics,
}

impl ConnectionSupervisor {
    pub fn new(deps: SupervisorDeps, config: SupervisorConfig) -> Result<Self, SupervisorError> {
        config.validate()?;
        Ok(Self {
            router: deps.router,
            presence: deps.presence,
            locations: deps.locations,
            orders: deps.orders,
            resolver: deps.resolver,
            config,
            metrics: SupervisorMetrics::new(),
        })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<RoomRouter> {
        &self.router
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    pub fn locations(&self) -> &Arc<dyn LocationApi> {
        &self.locations
    }

    pub fn orders(&self) -> &Arc<dyn OrderApi> {
        &self.orders
    }

    pub fn metrics(&self) -> &SupervisorMetrics {
        &self.metrics
    }

    /// Resolve a bearer credential without opening a session.
    pub async fn resolve(&self, token: &str) -> Result<Identity, SupervisorError> {
        self.resolver.resolve(token).await.inspect_err(|_| {
            self.metrics.record_auth_failure();
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Assign a connection id and register the connection's mailbox.
    pub fn open(&self) -> (Session, Mailbox) {
        let session = Session::new(ConnectionId::new(), self.config.websocket.rate_limit);
        let (handle, mailbox) = connection_channel(session.id(), self.config.websocket.buffer_size);
        self.router.register(handle);
        self.metrics.record_connect();
        info!(connection_id = %session.id(), "Connection opened");
        (session, mailbox)
    }

    /// Resolve the credential, attach presence and join the role's rooms.
    ///
    /// Customers join `customer:<id>` and `vendor-feed:global`; vendors join
    /// `vendor:<id>` and `vendor-orders:<id>`. Re-sending the same credential
    /// is a no-op; a different identity is refused.
    pub async fn authenticate(
        &self,
        session: &mut Session,
        token: &str,
    ) -> Result<SessionInfo, SupervisorError> {
        if session.is_closed() {
            return Err(SupervisorError::Closed);
        }
        let identity = self.resolve(token).await?;

        if let Some(current) = session.identity() {
            if current != &identity {
                warn!(
                    connection_id = %session.id(),
                    current = %current,
                    requested = %identity,
                    "Refused re-authentication as another identity"
                );
                return Err(SupervisorError::AlreadyAuthenticated(current.clone()));
            }
            return Ok(self.session_info(session.id(), &identity));
        }

        session.authenticate(identity.clone());
        let connections = self.presence.attach(identity.clone(), session.id());

        for channel in role_channels(&identity) {
            self.router.subscribe(&session.id(), channel)?;
        }
        session.advance(ConnectionPhase::Subscribed);

        let info = self.session_info(session.id(), &identity);
        self.router
            .send_direct(&session.id(), ServerEvent::Authenticated(info.clone()))
            .await?;

        info!(
            connection_id = %session.id(),
            identity = %identity,
            connections = connections,
            "Connection authenticated"
        );
        Ok(info)
    }

    /// Tear down a connection. Runs at most once per session.
    pub async fn close(&self, session: &mut Session) {
        if !session.advance(ConnectionPhase::Closed) {
            return;
        }
        let connection_id = session.id();
        let channels = self.router.unsubscribe_all(&connection_id);
        let detached = self.presence.detach(&connection_id);
        self.metrics.record_disconnect();

        if let Some(detached) = &detached {
            if detached.went_offline() && self.config.presence.auto_offline {
                if let Identity::Vendor(vendor_id) = &detached.identity {
                    if let Err(err) = self
                        .locations
                        .set_online_status(&detached.identity, vendor_id, false)
                        .await
                    {
                        error!(vendor_id = %vendor_id, error = %err, "Failed to mark vendor offline");
                    }
                }
            }
        }

        info!(
            connection_id = %connection_id,
            identity = ?detached.as_ref().map(|d| d.identity.to_string()),
            channels = channels.len(),
            "Connection closed"
        );
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Handle one inbound text frame; failures go back to the client as an
    /// `error` event.
    pub async fn process_message(&self, session: &mut Session, text: &str) {
        self.metrics.record_message();
        if let Err(err) = self.handle_text(session, text).await {
            self.reject(session, &err).await;
        }
    }

    /// Size check, rate check, parse, dispatch.
    pub async fn handle_text(&self, session: &mut Session, text: &str) -> Result<(), SupervisorError> {
        let max = self.config.websocket.max_message_size;
        if text.len() > max {
            return Err(SupervisorError::MessageTooLarge {
                size: text.len(),
                max,
            });
        }
        if !session.check_rate() {
            self.metrics.record_rate_limited();
            return Err(SupervisorError::RateLimited);
        }
        let event: ClientEvent =
            serde_json::from_str(text).map_err(|e| SupervisorError::Malformed(e.to_string()))?;
        self.handle_event(session, event).await
    }

    pub async fn handle_event(
        &self,
        session: &mut Session,
        event: ClientEvent,
    ) -> Result<(), SupervisorError> {
        debug!(connection_id = %session.id(), event = event.name(), "Inbound event");

        let event = match event {
            ClientEvent::Authenticate(payload) => {
                return self.authenticate(session, &payload.token).await.map(|_| ());
            }
            other => other,
        };
        let identity = session.require_identity()?.clone();

        match event {
            ClientEvent::Authenticate(_) => Ok(()),
            ClientEvent::JoinVendorRoom(vendor_id) => {
                let channel = Channel::vendor(&vendor_id);
                if !self.may_track_vendor(&identity, &vendor_id).await? {
                    return Err(SupervisorError::ForbiddenRoom {
                        actor: identity,
                        channel,
                    });
                }
                self.join(session, channel)
            }
            ClientEvent::JoinCustomerRoom(customer_id) => {
                let channel = Channel::customer(&customer_id);
                if !identity.is_customer(&customer_id) {
                    return Err(SupervisorError::ForbiddenRoom {
                        actor: identity,
                        channel,
                    });
                }
                self.join(session, channel)
            }
            ClientEvent::CustomerLocation(payload) => {
                if !identity.is_customer(&payload.customer_id) {
                    return Err(SupervisorError::ForbiddenTarget {
                        actor: identity,
                        target: payload.customer_id.to_string(),
                    });
                }
                let origin = validate(payload.lat, payload.lng)?;
                session.set_origin(origin);
                let nearby = self.nearby(origin, None, false).await?;
                debug!(
                    connection_id = %session.id(),
                    found = nearby.len(),
                    "Answered customer location"
                );
                self.reply(session, ServerEvent::NearbyVendors(nearby)).await
            }
            ClientEvent::GetAllVendorLocations => {
                let positions: Vec<VendorPosition> = self
                    .locations
                    .all_locations()
                    .await?
                    .iter()
                    .map(|tracked| VendorPosition::from(&tracked.location))
                    .collect();
                self.reply(session, ServerEvent::AllVendorLocations(positions))
                    .await
            }
            ClientEvent::UpdateLocation(payload) => {
                let vendor_id = identity
                    .as_vendor()
                    .cloned()
                    .ok_or(SupervisorError::WrongRole(Role::Vendor))?;
                let update = LocationUpdate {
                    vendor_id,
                    lat: payload.lat,
                    lng: payload.lng,
                    current_stop: payload.current_stop,
                };
                self.locations.update_location(&identity, update).await?;
                Ok(())
            }
            ClientEvent::SetOnlineStatus(payload) => {
                let vendor_id = identity
                    .as_vendor()
                    .cloned()
                    .ok_or(SupervisorError::WrongRole(Role::Vendor))?;
                self.locations
                    .set_online_status(&identity, &vendor_id, payload.is_online)
                    .await?;
                Ok(())
            }
            ClientEvent::UpdateOrderStatus(update) => {
                self.orders
                    .transition(&update.order_id, update.status, &identity)
                    .await?;
                Ok(())
            }
        }
    }

    /// Vendors within the effective radius of `origin`, nearest first.
    pub async fn nearby(
        &self,
        origin: Coordinates,
        radius_km: Option<f64>,
        online_only: bool,
    ) -> Result<Vec<NearbyVendor>, SupervisorError> {
        let radius_km = self.config.discovery.effective_radius(radius_km);
        let tracked = self.locations.all_locations().await?;
        let candidates = tracked
            .into_iter()
            .filter(|vendor| !online_only || vendor.is_online);

        Ok(within_radius(candidates, origin, radius_km)?
            .into_iter()
            .map(|result| NearbyVendor {
                vendor_id: result.vendor.location.vendor_id,
                lat: result.vendor.location.lat,
                lng: result.vendor.location.lng,
                current_stop: result.vendor.location.current_stop,
                distance_km: result.distance_km,
            })
            .collect())
    }

    pub fn stats(&self) -> SupervisorStats {
        let router = self.router.stats();
        SupervisorStats {
            connections: router.connections,
            channels: router.channels,
            subscriptions: router.subscriptions,
            published: router.published,
            delivered: router.delivered,
            dropped: router.dropped,
            online_vendors: self.presence.online_count(Role::Vendor),
            online_customers: self.presence.online_count(Role::Customer),
            sessions: self.metrics.snapshot(),
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// The owning vendor, or a customer with an order placed at that vendor.
    async fn may_track_vendor(
        &self,
        identity: &Identity,
        vendor_id: &VendorId,
    ) -> Result<bool, SupervisorError> {
        match identity {
            Identity::Vendor(_) => Ok(identity.is_vendor(vendor_id)),
            Identity::Customer(customer_id) => Ok(self
                .orders
                .orders_for_customer(customer_id)
                .await?
                .iter()
                .any(|order| &order.vendor_id == vendor_id)),
        }
    }

    fn join(&self, session: &mut Session, channel: Channel) -> Result<(), SupervisorError> {
        if self.router.subscribe(&session.id(), channel)? {
            session.advance(ConnectionPhase::Subscribed);
        }
        Ok(())
    }

    /// Send an event to this connection only.
    async fn reply(&self, session: &Session, event: ServerEvent) -> Result<(), SupervisorError> {
        self.router.send_direct(&session.id(), event).await?;
        Ok(())
    }

    /// Report `err` to the client as an `error` event.
    pub async fn reject(&self, session: &Session, err: &SupervisorError) {
        self.metrics.record_rejection();
        let api = ApiError::from(err);
        warn!(
            connection_id = %session.id(),
            code = %api.code,
            error = %err,
            "Rejected inbound event"
        );
        if let Err(send_err) = self.router.send_direct(&session.id(), api.to_event()).await {
            debug!(connection_id = %session.id(), error = %send_err, "Could not deliver error event");
        }
    }

    fn session_info(&self, connection_id: ConnectionId, identity: &Identity) -> SessionInfo {
        SessionInfo {
            connection_id,
            role: identity.role(),
            id: identity.id_str().to_string(),
        }
    }
}

/// Rooms a connection joins as soon as its identity is known.
fn role_channels(identity: &Identity) -> Vec<Channel> {
    match identity {
        Identity::Vendor(vendor_id) => {
            vec![Channel::vendor(vendor_id), Channel::vendor_orders(vendor_id)]
        }
        Identity::Customer(customer_id) => {
            vec![Channel::customer(customer_id), Channel::VendorFeed]
        }
    }
}

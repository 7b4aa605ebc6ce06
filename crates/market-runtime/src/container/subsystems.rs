//! # Subsystem Container
//!
//! Builds every component once, around a single Room Router and Presence
//! Registry, and hands the same instances to whoever needs them.
//!
//! ## Initialization Order
//!
//! 1. Room Router (with the configured delivery timeout), Presence Registry
//! 2. Location Broadcaster, Order Synchronizer (publish through the router)
//! 3. Token resolver
//! 4. Connection Supervisor (dispatches into all of the above)

use cs_02_location_broadcaster::{InMemoryLocationStore, LocationBroadcaster};
use cs_03_order_sync::{InMemoryOrderStore, OrderSynchronizer};
use cs_04_connection_supervisor::{
    ConnectionSupervisor, HmacTokenResolver, SupervisorDeps, SupervisorError,
};
use shared_bus::{PresenceRegistry, RoomRouter};
use std::sync::Arc;
use tracing::info;

use crate::container::config::MarketConfig;

pub type Locations = LocationBroadcaster<InMemoryLocationStore>;
pub type Orders = OrderSynchronizer<InMemoryOrderStore>;

/// Central container holding the live subsystem instances.
pub struct MarketContainer {
    pub config: MarketConfig,
    pub router: Arc<RoomRouter>,
    pub presence: Arc<PresenceRegistry>,
    pub location_store: Arc<InMemoryLocationStore>,
    pub order_store: Arc<InMemoryOrderStore>,
    pub locations: Arc<Locations>,
    pub orders: Arc<Orders>,
    pub tokens: HmacTokenResolver,
    pub supervisor: Arc<ConnectionSupervisor>,
}

impl MarketContainer {
    pub fn new(config: MarketConfig) -> Result<Self, SupervisorError> {
        let settings = &config.supervisor;

        let router = Arc::new(RoomRouter::with_delivery_timeout(settings.delivery.timeout));
        let presence = Arc::new(PresenceRegistry::new());
        info!(
            delivery_timeout_ms = settings.delivery.timeout.as_millis() as u64,
            "Room router ready"
        );

        let location_store = Arc::new(InMemoryLocationStore::new());
        let locations = Arc::new(LocationBroadcaster::new(
            Arc::clone(&location_store),
            router.clone(),
        ));

        let order_store = Arc::new(InMemoryOrderStore::new());
        let orders = Arc::new(OrderSynchronizer::new(
            Arc::clone(&order_store),
            router.clone(),
        ));

        let tokens = HmacTokenResolver::new(&settings.security.token_secret);

        let supervisor = Arc::new(ConnectionSupervisor::new(
            SupervisorDeps {
                router: Arc::clone(&router),
                presence: Arc::clone(&presence),
                locations: locations.clone(),
                orders: orders.clone(),
                resolver: Arc::new(tokens.clone()),
            },
            settings.clone(),
        )?);
        info!("Connection supervisor ready");

        Ok(Self {
            config,
            router,
            presence,
            location_store,
            order_store,
            locations,
            orders,
            tokens,
            supervisor,
        })
    }
}

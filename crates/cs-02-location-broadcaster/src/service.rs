//! Location Broadcaster Service
//!
//! Implements [`LocationApi`] on top of a [`LocationStore`] and an
//! [`EventPublisher`].

use async_trait::async_trait;
use chrono::Utc;
use cs_01_geo_engine::validate;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, KeyedLocks};
use shared_types::{
    Channel, Identity, ServerEvent, VendorId, VendorLocation, VendorPosition, VendorStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::{BroadcastError, LocationUpdate, TrackedVendor};
use crate::ports::{LocationApi, LocationStore};

/// Sole owner of vendor location records.
pub struct LocationBroadcaster<S: LocationStore> {
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    /// Held across persist-then-publish so one vendor's events stay ordered.
    locks: KeyedLocks<VendorId>,
    online: RwLock<HashMap<VendorId, bool>>,
}

impl<S: LocationStore> LocationBroadcaster<S> {
    pub fn new(store: Arc<S>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            locks: KeyedLocks::new(),
            online: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn authorize(actor: &Identity, vendor_id: &VendorId) -> Result<(), BroadcastError> {
        if actor.is_vendor(vendor_id) {
            return Ok(());
        }
        warn!(actor = %actor, vendor_id = %vendor_id, "Rejected location mutation");
        Err(BroadcastError::Unauthorized {
            actor: actor.clone(),
            vendor_id: vendor_id.clone(),
        })
    }

    /// Publish to the global feed, then to the vendor's own room.
    async fn announce(&self, vendor_id: &VendorId, event: ServerEvent) -> usize {
        let feed = self
            .publisher
            .publish(&Channel::VendorFeed, event.clone())
            .await;
        let room = self
            .publisher
            .publish(&Channel::vendor(vendor_id), event)
            .await;
        feed.delivered + room.delivered
    }
}

#[async_trait]
impl<S: LocationStore + 'static> LocationApi for LocationBroadcaster<S> {
    async fn update_location(
        &self,
        actor: &Identity,
        update: LocationUpdate,
    ) -> Result<VendorLocation, BroadcastError> {
        Self::authorize(actor, &update.vendor_id)?;
        let coordinates = validate(update.lat, update.lng)?;

        let _guard = self.locks.lock(&update.vendor_id).await;

        let location = VendorLocation {
            vendor_id: update.vendor_id,
            lat: coordinates.lat,
            lng: coordinates.lng,
            current_stop: update.current_stop,
            updated_at: Utc::now(),
        };

        if let Err(err) = self.store.save(location.clone()).await {
            error!(vendor_id = %location.vendor_id, error = %err, "Failed to persist location");
            return Err(err);
        }

        let delivered = self
            .announce(
                &location.vendor_id,
                ServerEvent::VendorMoved(VendorPosition::from(&location)),
            )
            .await;

        debug!(
            vendor_id = %location.vendor_id,
            lat = location.lat,
            lng = location.lng,
            delivered = delivered,
            "Vendor moved"
        );
        Ok(location)
    }

    async fn set_online_status(
        &self,
        actor: &Identity,
        vendor_id: &VendorId,
        is_online: bool,
    ) -> Result<VendorStatus, BroadcastError> {
        Self::authorize(actor, vendor_id)?;

        let _guard = self.locks.lock(vendor_id).await;
        self.online.write().insert(vendor_id.clone(), is_online);

        let status = VendorStatus {
            vendor_id: vendor_id.clone(),
            is_online,
        };
        let delivered = self
            .announce(vendor_id, ServerEvent::VendorStatusChanged(status.clone()))
            .await;

        debug!(
            vendor_id = %vendor_id,
            is_online = is_online,
            delivered = delivered,
            "Vendor status changed"
        );
        Ok(status)
    }

    async fn location(&self, vendor_id: &VendorId) -> Result<Option<VendorLocation>, BroadcastError> {
        self.store.load(vendor_id).await
    }

    async fn all_locations(&self) -> Result<Vec<TrackedVendor>, BroadcastError> {
        let mut locations = self.store.all().await?;
        locations.sort_by(|a, b| a.vendor_id.cmp(&b.vendor_id));

        let online = self.online.read();
        Ok(locations
            .into_iter()
            .map(|location| TrackedVendor {
                is_online: online.get(&location.vendor_id).copied().unwrap_or(false),
                location,
            })
            .collect())
    }

    fn is_online(&self, vendor_id: &VendorId) -> bool {
        self.online.read().get(vendor_id).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLocationStore;
    use shared_bus::{connection_channel, Mailbox, RoomRouter};
    use shared_types::{ConnectionId, CustomerId, ErrorKind};

    struct Fixture {
        router: Arc<RoomRouter>,
        store: Arc<InMemoryLocationStore>,
        broadcaster: LocationBroadcaster<InMemoryLocationStore>,
    }

    fn fixture() -> Fixture {
        let router = Arc::new(RoomRouter::new());
        let store = Arc::new(InMemoryLocationStore::new());
        let broadcaster = LocationBroadcaster::new(store.clone(), router.clone());
        Fixture {
            router,
            store,
            broadcaster,
        }
    }

    fn listen(router: &RoomRouter, channel: Channel) -> Mailbox {
        let (handle, mailbox) = connection_channel(ConnectionId::new(), 16);
        let id = handle.id();
        router.register(handle);
        router.subscribe(&id, channel).unwrap();
        mailbox
    }

    fn vendor(id: &str) -> Identity {
        Identity::Vendor(VendorId::new(id))
    }

    #[tokio::test]
    async fn test_update_reaches_feed_and_vendor_room() {
        let f = fixture();
        let mut feed = listen(&f.router, Channel::VendorFeed);
        let mut room = listen(&f.router, Channel::vendor(&VendorId::new("v1")));
        let mut other = listen(&f.router, Channel::vendor(&VendorId::new("v2")));

        let update = LocationUpdate::new(VendorId::new("v1"), 12.90, 77.59).with_stop("MG Road");
        f.broadcaster
            .update_location(&vendor("v1"), update)
            .await
            .unwrap();

        let expected = ServerEvent::VendorMoved(VendorPosition {
            vendor_id: VendorId::new("v1"),
            lat: 12.90,
            lng: 77.59,
            current_stop: Some("MG Road".into()),
        });
        assert_eq!(*feed.try_recv().unwrap(), expected);
        assert_eq!(*room.try_recv().unwrap(), expected);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_wrong_vendor_is_rejected() {
        let f = fixture();
        let mut feed = listen(&f.router, Channel::VendorFeed);

        let update = LocationUpdate::new(VendorId::new("v1"), 12.90, 77.59);
        let err = f
            .broadcaster
            .update_location(&vendor("v2"), update.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnauthorizedMutation);

        let err = f
            .broadcaster
            .update_location(&Identity::Customer(CustomerId::new("v1")), update)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnauthorizedMutation);

        assert!(f.store.is_empty());
        assert!(feed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_invalid_coordinate_has_no_effect() {
        let f = fixture();
        let mut feed = listen(&f.router, Channel::VendorFeed);

        let err = f
            .broadcaster
            .update_location(&vendor("v1"), LocationUpdate::new(VendorId::new("v1"), 91.0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCoordinate);
        assert!(f.store.is_empty());
        assert!(feed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_blocks_publish() {
        let f = fixture();
        let mut feed = listen(&f.router, Channel::VendorFeed);
        f.store.fail_writes(true);

        let err = f
            .broadcaster
            .update_location(&vendor("v1"), LocationUpdate::new(VendorId::new("v1"), 12.9, 77.59))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert!(feed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_going_offline_keeps_location() {
        let f = fixture();
        let v1 = VendorId::new("v1");
        f.broadcaster
            .update_location(&vendor("v1"), LocationUpdate::new(v1.clone(), 12.9, 77.59))
            .await
            .unwrap();
        f.broadcaster
            .set_online_status(&vendor("v1"), &v1, true)
            .await
            .unwrap();
        assert!(f.broadcaster.is_online(&v1));

        let mut feed = listen(&f.router, Channel::VendorFeed);
        f.broadcaster
            .set_online_status(&vendor("v1"), &v1, false)
            .await
            .unwrap();

        assert_eq!(
            *feed.try_recv().unwrap(),
            ServerEvent::VendorStatusChanged(VendorStatus {
                vendor_id: v1.clone(),
                is_online: false,
            })
        );
        assert!(!f.broadcaster.is_online(&v1));
        let location = f.broadcaster.location(&v1).await.unwrap().unwrap();
        assert_eq!(location.lat, 12.9);
    }

    #[tokio::test]
    async fn test_successive_updates_overwrite_in_order() {
        let f = fixture();
        let v1 = VendorId::new("v1");
        let mut room = listen(&f.router, Channel::vendor(&v1));

        for step in 0..5 {
            let lat = 12.90 + f64::from(step) * 0.01;
            f.broadcaster
                .update_location(&vendor("v1"), LocationUpdate::new(v1.clone(), lat, 77.59))
                .await
                .unwrap();
        }

        let lats: Vec<f64> = room
            .drain()
            .iter()
            .filter_map(|event| match event.as_ref() {
                ServerEvent::VendorMoved(position) => Some(position.lat),
                _ => None,
            })
            .collect();
        assert_eq!(lats.len(), 5);
        assert!(lats.windows(2).all(|w| w[0] < w[1]));

        let all = f.broadcaster.all_locations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].location.lat, lats[4]);
        assert!(!all[0].is_online);
    }
}

//! # Room Router
//!
//! Maps channels to the live connections subscribed to them and fans
//! events out with a bounded per-subscriber delivery time.

use crate::connection::ConnectionHandle;
use crate::errors::RouterError;
use crate::publisher::{EventPublisher, PublishReport};
use crate::DEFAULT_DELIVERY_TIMEOUT;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use shared_types::{Channel, ConnectionId, ServerEvent};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Counters exposed for monitoring.
#[derive(Debug, Default)]
pub struct RouterStats {
    pub published: AtomicU64,
    pub delivered: AtomicU64,
    pub dropped: AtomicU64,
}

/// Point-in-time view of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterStatsSnapshot {
    pub connections: usize,
    pub channels: usize,
    pub subscriptions: usize,
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
}

struct ConnectionEntry {
    handle: ConnectionHandle,
    channels: HashSet<Channel>,
}

#[derive(Default)]
struct RouterState {
    channels: HashMap<Channel, HashMap<ConnectionId, ConnectionHandle>>,
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl RouterState {
    fn remove_from_channel(&mut self, channel: &Channel, connection_id: &ConnectionId) -> bool {
        let Some(subscribers) = self.channels.get_mut(channel) else {
            return false;
        };
        let removed = subscribers.remove(connection_id).is_some();
        if subscribers.is_empty() {
            self.channels.remove(channel);
        }
        removed
    }
}

/// Channel → subscriber routing table.
///
/// Both directions of the table (channel → connections and
/// connection → channels) live under one lock, so subscribe and
/// `unsubscribe_all` are atomic with respect to each other. Publishing
/// snapshots the subscriber set and delivers outside the lock.
pub struct RoomRouter {
    state: RwLock<RouterState>,
    delivery_timeout: Duration,
    stats: RouterStats,
}

impl RoomRouter {
    /// Create a router with the default delivery timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delivery_timeout(DEFAULT_DELIVERY_TIMEOUT)
    }

    #[must_use]
    pub fn with_delivery_timeout(delivery_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(RouterState::default()),
            delivery_timeout,
            stats: RouterStats::default(),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        self.delivery_timeout
    }

    /// Make a connection known to the router. Returns `false` if it already was.
    pub fn register(&self, handle: ConnectionHandle) -> bool {
        let mut state = self.state.write();
        let id = handle.id();
        if state.connections.contains_key(&id) {
            return false;
        }
        state.connections.insert(
            id,
            ConnectionEntry {
                handle,
                channels: HashSet::new(),
            },
        );
        debug!(connection_id = %id, "Registered connection");
        true
    }

    pub fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.state.read().connections.contains_key(connection_id)
    }

    /// Subscribe a registered connection to a channel.
    ///
    /// Idempotent: returns `Ok(false)` when already subscribed.
    pub fn subscribe(
        &self,
        connection_id: &ConnectionId,
        channel: Channel,
    ) -> Result<bool, RouterError> {
        let mut state = self.state.write();
        let entry = state
            .connections
            .get_mut(connection_id)
            .ok_or(RouterError::UnknownConnection(*connection_id))?;
        if !entry.channels.insert(channel.clone()) {
            return Ok(false);
        }
        let handle = entry.handle.clone();
        state
            .channels
            .entry(channel.clone())
            .or_default()
            .insert(*connection_id, handle);

        debug!(
            connection_id = %connection_id,
            channel = %channel,
            "Subscribed connection"
        );
        Ok(true)
    }

    /// Remove one subscription. Returns `true` if it existed.
    pub fn unsubscribe(&self, connection_id: &ConnectionId, channel: &Channel) -> bool {
        let mut state = self.state.write();
        if let Some(entry) = state.connections.get_mut(connection_id) {
            entry.channels.remove(channel);
        }
        state.remove_from_channel(channel, connection_id)
    }

    /// Remove a connection from every channel and forget it.
    ///
    /// Returns the channels it was subscribed to; a second call returns
    /// an empty list.
    pub fn unsubscribe_all(&self, connection_id: &ConnectionId) -> Vec<Channel> {
        let mut state = self.state.write();
        let Some(entry) = state.connections.remove(connection_id) else {
            return Vec::new();
        };
        let mut channels: Vec<Channel> = entry.channels.into_iter().collect();
        for channel in &channels {
            state.remove_from_channel(channel, connection_id);
        }
        channels.sort();

        debug!(
            connection_id = %connection_id,
            channels = channels.len(),
            "Removed all subscriptions for connection"
        );
        channels
    }

    pub fn is_subscribed(&self, connection_id: &ConnectionId, channel: &Channel) -> bool {
        self.state
            .read()
            .channels
            .get(channel)
            .is_some_and(|subscribers| subscribers.contains_key(connection_id))
    }

    /// Connections currently subscribed to a channel, sorted.
    pub fn subscribers(&self, channel: &Channel) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self
            .state
            .read()
            .channels
            .get(channel)
            .map(|subscribers| subscribers.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Channels a connection is subscribed to, sorted.
    pub fn channels_of(&self, connection_id: &ConnectionId) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self
            .state
            .read()
            .connections
            .get(connection_id)
            .map(|entry| entry.channels.iter().cloned().collect())
            .unwrap_or_default();
        channels.sort();
        channels
    }

    /// Deliver an event to one connection only, bypassing channels.
    pub async fn send_direct(
        &self,
        connection_id: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), RouterError> {
        let handle = self
            .state
            .read()
            .connections
            .get(connection_id)
            .map(|entry| entry.handle.clone())
            .ok_or(RouterError::UnknownConnection(*connection_id))?;

        handle
            .deliver(Arc::new(event), self.delivery_timeout)
            .await
            .map_err(|reason| RouterError::Delivery {
                connection_id: *connection_id,
                reason,
            })?;
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> RouterStatsSnapshot {
        let state = self.state.read();
        RouterStatsSnapshot {
            connections: state.connections.len(),
            channels: state.channels.len(),
            subscriptions: state.channels.values().map(HashMap::len).sum(),
            published: self.stats.published.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }

    fn drop_subscriber(&self, channel: &Channel, connection_id: &ConnectionId) {
        let mut state = self.state.write();
        if let Some(entry) = state.connections.get_mut(connection_id) {
            entry.channels.remove(channel);
        }
        state.remove_from_channel(channel, connection_id);
    }
}

impl Default for RoomRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for RoomRouter {
    async fn publish(&self, channel: &Channel, event: ServerEvent) -> PublishReport {
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        let event_name = event.name();

        let targets: Vec<ConnectionHandle> = {
            let state = self.state.read();
            state
                .channels
                .get(channel)
                .map(|subscribers| subscribers.values().cloned().collect())
                .unwrap_or_default()
        };

        if targets.is_empty() {
            debug!(channel = %channel, event = event_name, "No subscribers for event");
            return PublishReport::empty(channel.clone());
        }

        let event = Arc::new(event);
        let timeout = self.delivery_timeout;
        let outcomes = join_all(targets.iter().map(|handle| {
            let event = Arc::clone(&event);
            async move { (handle, handle.deliver(event, timeout).await) }
        }))
        .await;

        let mut report = PublishReport::empty(channel.clone());
        for (handle, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    warn!(
                        channel = %channel,
                        connection_id = %handle.id(),
                        event = event_name,
                        reason = %reason,
                        "Dropping subscriber after failed delivery"
                    );
                    self.drop_subscriber(channel, &handle.id());
                    handle.notify_lagging();
                    report.dropped.push(handle.id());
                }
            }
        }

        self.stats
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.stats
            .dropped
            .fetch_add(report.dropped.len() as u64, Ordering::Relaxed);

        debug!(
            channel = %channel,
            event = event_name,
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "Event published"
        );
        report
    }

    fn events_published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }
}

//! # Event Publisher
//!
//! Defines the publishing side of the room router.

use async_trait::async_trait;
use shared_types::{Channel, ConnectionId, ServerEvent};

/// Outcome of one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Channel the event was published to.
    pub channel: Channel,
    /// Subscribers that accepted the event.
    pub delivered: usize,
    /// Subscribers that failed and were dropped from the channel.
    pub dropped: Vec<ConnectionId>,
}

impl PublishReport {
    pub fn empty(channel: Channel) -> Self {
        Self {
            channel,
            delivered: 0,
            dropped: Vec::new(),
        }
    }
}

/// Trait for publishing events to a channel.
///
/// This is the only interface the location broadcaster and the order
/// synchronizer need from the router.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to every connection subscribed to `channel`.
    ///
    /// A failing subscriber never fails the publish as a whole.
    async fn publish(&self, channel: &Channel, event: ServerEvent) -> PublishReport;

    /// Get the total number of publish calls.
    fn events_published(&self) -> u64;
}

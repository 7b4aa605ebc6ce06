//! # Connection Mailboxes
//!
//! Each live connection owns a bounded FIFO mailbox. The router holds the
//! sending half ([`ConnectionHandle`]); the connection's writer task drains
//! the receiving half ([`Mailbox`]).

use crate::errors::DeliveryError;
use shared_types::{ConnectionId, ServerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

/// Lifecycle of a connection.
///
/// ```text
/// Connecting ──→ Authenticated ──→ Subscribed ──→ Closed
///      │               │                            ↑
///      └───────────────┴────────────────────────────┘
/// ```
///
/// A connection only receives room events once `Subscribed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    Connecting,
    Authenticated,
    Subscribed,
    Closed,
}

impl ConnectionPhase {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// `Subscribed -> Subscribed` is legal (joining further rooms).
    pub fn can_advance_to(self, next: ConnectionPhase) -> bool {
        use ConnectionPhase::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Connecting, Authenticated) => true,
            (Authenticated, Subscribed) => true,
            (Subscribed, Subscribed) => true,
            _ => false,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            ConnectionPhase::Authenticated | ConnectionPhase::Subscribed
        )
    }
}

/// Create the two halves of a connection mailbox.
pub fn connection_channel(id: ConnectionId, capacity: usize) -> (ConnectionHandle, Mailbox) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let lagged = Arc::new(Notify::new());
    (
        ConnectionHandle {
            id,
            sender,
            lagged: Arc::clone(&lagged),
        },
        Mailbox {
            id,
            receiver,
            lagged,
        },
    )
}

/// Sending half of a connection mailbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<Arc<ServerEvent>>,
    lagged: Arc<Notify>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Deliver one event, waiting at most `timeout` for mailbox space.
    pub async fn deliver(
        &self,
        event: Arc<ServerEvent>,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        match tokio::time::timeout(timeout, self.sender.send(event)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DeliveryError::Closed),
            Err(_) => Err(DeliveryError::Timeout),
        }
    }

    /// Tell the connection it was dropped from a channel for being too slow.
    pub fn notify_lagging(&self) {
        debug!(connection_id = %self.id, "Connection marked as lagging");
        self.lagged.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving half of a connection mailbox.
#[derive(Debug)]
pub struct Mailbox {
    id: ConnectionId,
    receiver: mpsc::Receiver<Arc<ServerEvent>>,
    lagged: Arc<Notify>,
}

impl Mailbox {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Receive the next event.
    ///
    /// Returns `None` once every handle has been dropped.
    pub async fn recv(&mut self) -> Option<Arc<ServerEvent>> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<ServerEvent>> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<Arc<ServerEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Resolves once the router has dropped this connection from a channel
    /// because it could not keep up.
    pub async fn lagged(&self) {
        self.lagged.notified().await;
    }

    /// The lag signal on its own, for waiting on it while `recv` holds
    /// the mailbox mutably.
    pub fn lag_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.lagged)
    }

    /// Close the receiving side; further deliveries fail with `Closed`.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{VendorId, VendorStatus};

    fn status_event() -> Arc<ServerEvent> {
        Arc::new(ServerEvent::VendorStatusChanged(VendorStatus {
            vendor_id: VendorId::new("v1"),
            is_online: true,
        }))
    }

    #[test]
    fn test_phase_transitions() {
        use ConnectionPhase::*;
        assert!(Connecting.can_advance_to(Authenticated));
        assert!(Authenticated.can_advance_to(Subscribed));
        assert!(Subscribed.can_advance_to(Subscribed));
        assert!(Connecting.can_advance_to(Closed));
        assert!(!Connecting.can_advance_to(Subscribed));
        assert!(!Closed.can_advance_to(Authenticated));
        assert!(!Subscribed.can_advance_to(Authenticated));
    }

    #[tokio::test]
    async fn test_deliver_and_recv() {
        let (handle, mut mailbox) = connection_channel(ConnectionId::new(), 4);
        handle
            .deliver(status_event(), Duration::from_millis(50))
            .await
            .unwrap();
        let event = mailbox.recv().await.unwrap();
        assert_eq!(event.name(), "vendor_status_changed");
    }

    #[tokio::test]
    async fn test_deliver_times_out_when_full() {
        let (handle, _mailbox) = connection_channel(ConnectionId::new(), 1);
        handle
            .deliver(status_event(), Duration::from_millis(10))
            .await
            .unwrap();
        let result = handle
            .deliver(status_event(), Duration::from_millis(10))
            .await;
        assert_eq!(result, Err(DeliveryError::Timeout));
    }

    #[tokio::test]
    async fn test_deliver_to_closed_mailbox() {
        let (handle, mut mailbox) = connection_channel(ConnectionId::new(), 1);
        mailbox.close();
        let result = handle
            .deliver(status_event(), Duration::from_millis(10))
            .await;
        assert_eq!(result, Err(DeliveryError::Closed));
        assert!(handle.is_closed());
    }
}

//! Per-connection session state.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use shared_bus::ConnectionPhase;
use shared_types::{ConnectionId, Coordinates, Identity};
use std::fmt;
use std::num::NonZeroU32;

use crate::domain::error::SupervisorError;

/// Inbound message limiter for one connection.
pub type MessageLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// `per_second` messages per second, with a burst of the same size.
pub fn message_limiter(per_second: u32) -> MessageLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// State of one live connection as seen by the supervisor.
pub struct Session {
    connection_id: ConnectionId,
    phase: ConnectionPhase,
    identity: Option<Identity>,
    /// Last origin reported through `customer_location`.
    origin: Option<Coordinates>,
    rate: MessageLimiter,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.connection_id)
            .field("phase", &self.phase)
            .field("identity", &self.identity)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(connection_id: ConnectionId, rate_limit: u32) -> Self {
        Self {
            connection_id,
            phase: ConnectionPhase::Connecting,
            identity: None,
            origin: None,
            rate: message_limiter(rate_limit),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn require_identity(&self) -> Result<&Identity, SupervisorError> {
        match self.phase {
            ConnectionPhase::Closed => Err(SupervisorError::Closed),
            _ => self.identity.as_ref().ok_or(SupervisorError::Unauthenticated),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.phase == ConnectionPhase::Closed
    }

    pub fn origin(&self) -> Option<Coordinates> {
        self.origin
    }

    pub(crate) fn set_origin(&mut self, origin: Coordinates) {
        self.origin = Some(origin);
    }

    /// Take one message from the allowance; `false` when none is left.
    pub(crate) fn check_rate(&mut self) -> bool {
        self.rate.check().is_ok()
    }

    /// Bind the identity and move to `Authenticated`.
    pub(crate) fn authenticate(&mut self, identity: Identity) -> bool {
        if !self.advance(ConnectionPhase::Authenticated) {
            return false;
        }
        self.identity = Some(identity);
        true
    }

    /// Move to `next` if the lifecycle allows it.
    pub(crate) fn advance(&mut self, next: ConnectionPhase) -> bool {
        if self.phase.can_advance_to(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }
}

//! # Presence Registry
//!
//! Tracks which identities are attached to which live connections.
//! An identity may hold several connections at once (multiple tabs or
//! devices); its entry disappears when the last one detaches.

use parking_lot::RwLock;
use shared_types::{ConnectionId, Identity, Role};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Live connections of one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub identity: Identity,
    pub role: Role,
    pub connection_ids: BTreeSet<ConnectionId>,
}

/// Result of detaching a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detached {
    pub identity: Identity,
    /// Connections the identity still holds after this detach.
    pub remaining: usize,
}

impl Detached {
    /// True if this was the identity's last connection.
    pub fn went_offline(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Default)]
struct PresenceState {
    entries: HashMap<Identity, PresenceEntry>,
    by_connection: HashMap<ConnectionId, Identity>,
}

/// Identity ↔ connection registry.
#[derive(Default)]
pub struct PresenceRegistry {
    state: RwLock<PresenceState>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection to an identity, creating the entry on first use.
    ///
    /// Returns the number of connections the identity now holds. A
    /// connection already attached to a different identity is moved.
    pub fn attach(&self, identity: Identity, connection_id: ConnectionId) -> usize {
        let mut state = self.state.write();

        if let Some(previous) = state.by_connection.get(&connection_id).cloned() {
            if previous != identity {
                Self::remove_connection(&mut state, &previous, &connection_id);
            }
        }

        state.by_connection.insert(connection_id, identity.clone());
        let entry = state
            .entries
            .entry(identity.clone())
            .or_insert_with(|| PresenceEntry {
                role: identity.role(),
                identity: identity.clone(),
                connection_ids: BTreeSet::new(),
            });
        entry.connection_ids.insert(connection_id);
        let count = entry.connection_ids.len();

        debug!(
            identity = %identity,
            connection_id = %connection_id,
            connections = count,
            "Attached connection"
        );
        count
    }

    /// Detach a connection. Returns `None` if it was not attached.
    pub fn detach(&self, connection_id: &ConnectionId) -> Option<Detached> {
        let mut state = self.state.write();
        let identity = state.by_connection.remove(connection_id)?;
        let remaining = Self::remove_connection(&mut state, &identity, connection_id);

        debug!(
            identity = %identity,
            connection_id = %connection_id,
            remaining = remaining,
            "Detached connection"
        );
        Some(Detached {
            identity,
            remaining,
        })
    }

    fn remove_connection(
        state: &mut PresenceState,
        identity: &Identity,
        connection_id: &ConnectionId,
    ) -> usize {
        let Some(entry) = state.entries.get_mut(identity) else {
            return 0;
        };
        entry.connection_ids.remove(connection_id);
        let remaining = entry.connection_ids.len();
        if remaining == 0 {
            state.entries.remove(identity);
        }
        remaining
    }

    pub fn entry(&self, identity: &Identity) -> Option<PresenceEntry> {
        self.state.read().entries.get(identity).cloned()
    }

    pub fn connections(&self, identity: &Identity) -> Vec<ConnectionId> {
        self.state
            .read()
            .entries
            .get(identity)
            .map(|entry| entry.connection_ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_online(&self, identity: &Identity) -> bool {
        self.state.read().entries.contains_key(identity)
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.state.read().by_connection.get(connection_id).cloned()
    }

    /// Number of identities of a role with at least one connection.
    pub fn online_count(&self, role: Role) -> usize {
        self.state
            .read()
            .entries
            .values()
            .filter(|entry| entry.role == role)
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.state.read().by_connection.len()
    }
}

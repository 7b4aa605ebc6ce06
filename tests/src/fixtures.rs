//! Shared fixtures: a fully wired market and socket-less clients.

use cs_04_connection_supervisor::{ConnectionSupervisor, Session};
use market_runtime::{MarketConfig, MarketContainer};
use shared_bus::Mailbox;
use shared_types::{CustomerId, Identity, ServerEvent, VendorId};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "cs-tests-secret";

/// The production wiring with in-memory stores.
pub struct Market {
    pub container: MarketContainer,
}

/// One connection driven without a socket.
pub struct Client {
    pub identity: Identity,
    pub session: Session,
    pub mailbox: Mailbox,
}

pub fn market() -> Market {
    market_with(|_| {})
}

pub fn market_with(configure: impl FnOnce(&mut MarketConfig)) -> Market {
    let mut config = MarketConfig::default();
    config.supervisor.security.token_secret = TEST_SECRET.to_string();
    configure(&mut config);
    config.validate().unwrap();
    Market {
        container: MarketContainer::new(config).unwrap(),
    }
}

pub fn vendor(id: &str) -> Identity {
    Identity::Vendor(VendorId::new(id))
}

pub fn customer(id: &str) -> Identity {
    Identity::Customer(CustomerId::new(id))
}

impl Market {
    pub fn supervisor(&self) -> &Arc<ConnectionSupervisor> {
        &self.container.supervisor
    }

    /// Open and authenticate a connection, consuming its `authenticated` event.
    pub async fn connect(&self, identity: &Identity) -> Client {
        let supervisor = self.supervisor();
        let (mut session, mut mailbox) = supervisor.open();
        let token = self.container.tokens.issue(identity).unwrap();
        supervisor.authenticate(&mut session, &token).await.unwrap();
        let first = mailbox.try_recv().unwrap();
        assert_eq!(first.name(), "authenticated");
        Client {
            identity: identity.clone(),
            session,
            mailbox,
        }
    }

    /// Deliver one inbound frame from `client`.
    pub async fn send(&self, client: &mut Client, event: serde_json::Value) {
        self.supervisor()
            .process_message(&mut client.session, &event.to_string())
            .await;
    }

    pub async fn disconnect(&self, client: &mut Client) {
        self.supervisor().close(&mut client.session).await;
    }
}

impl Client {
    /// Next event within `within`, if any.
    pub async fn next(&mut self, within: Duration) -> Option<Arc<ServerEvent>> {
        tokio::time::timeout(within, self.mailbox.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next event as wire JSON; panics if none arrives.
    pub async fn expect_json(&mut self) -> serde_json::Value {
        let event = self
            .next(Duration::from_secs(1))
            .await
            .unwrap_or_else(|| panic!("{} received nothing", self.identity));
        serde_json::to_value(event.as_ref()).unwrap()
    }

    pub fn assert_silent(&mut self) {
        if let Some(event) = self.mailbox.try_recv() {
            panic!("{} unexpectedly received {:?}", self.identity, event);
        }
    }
}

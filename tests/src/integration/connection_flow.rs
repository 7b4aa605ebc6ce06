//! # Connection Flow
//!
//! Room membership over a connection's lifetime, and presence across
//! several connections of the same identity.

#[cfg(test)]
mod tests {
    use crate::fixtures::{customer, market, market_with, vendor};
    use cs_02_location_broadcaster::LocationApi;
    use cs_03_order_sync::{NewOrder, OrderApi};
    use serde_json::json;
    use shared_types::{Channel, CustomerId, Identity, OrderItem, Role, VendorId};
    use std::time::Duration;

    #[tokio::test]
    async fn test_customer_rooms_after_authentication() {
        let market = market();
        let c1 = market.connect(&customer("c1")).await;

        let channels = market.container.router.channels_of(&c1.session.id());
        assert_eq!(
            channels,
            vec![Channel::customer(&CustomerId::new("c1")), Channel::VendorFeed]
        );
        assert!(market.container.presence.is_online(&customer("c1")));
    }

    #[tokio::test]
    async fn test_joining_a_room_twice_is_idempotent() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let joined = json!({ "event": "join_vendor_room", "data": "v1" });

        market.send(&mut v1, joined.clone()).await;
        market.send(&mut v1, joined).await;

        let router = &market.container.router;
        let id = VendorId::new("v1");
        assert_eq!(
            router.channels_of(&v1.session.id()),
            vec![Channel::vendor(&id), Channel::vendor_orders(&id)]
        );
        assert_eq!(router.subscribers(&Channel::vendor(&VendorId::new("v1"))).len(), 1);
        v1.assert_silent();
    }

    #[tokio::test]
    async fn test_foreign_room_is_refused() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;

        market
            .send(&mut c1, json!({ "event": "join_customer_room", "data": "c2" }))
            .await;

        assert_eq!(c1.expect_json().await["data"]["code"], "UNAUTHORIZED_MUTATION");
        assert!(!market
            .container
            .router
            .is_subscribed(&c1.session.id(), &Channel::customer(&CustomerId::new("c2"))));
    }

    #[tokio::test]
    async fn test_customer_tracks_vendor_after_ordering() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;
        let mut c2 = market.connect(&customer("c2")).await;
        let mut v1 = market.connect(&vendor("v1")).await;
        let join = json!({ "event": "join_vendor_room", "data": "v1" });

        market.send(&mut c1, join.clone()).await;
        assert_eq!(c1.expect_json().await["data"]["code"], "UNAUTHORIZED_MUTATION");

        let tea = NewOrder::new(VendorId::new("v1"), vec![OrderItem::new("Tea", 20.0, 10)]);
        market
            .container
            .orders
            .create(&c1.identity, tea.clone())
            .await
            .unwrap();
        assert_eq!(v1.expect_json().await["event"], "new_order");

        market.send(&mut c1, join).await;
        c1.assert_silent();
        assert!(market
            .container
            .router
            .is_subscribed(&c1.session.id(), &Channel::vendor(&VendorId::new("v1"))));

        market
            .container
            .orders
            .create(&c2.identity, tea)
            .await
            .unwrap();
        assert_eq!(v1.expect_json().await["event"], "new_order");
        tokio::time::sleep(Duration::from_millis(20)).await;
        c1.assert_silent();
        c2.assert_silent();
    }

    #[tokio::test]
    async fn test_disconnected_client_receives_nothing() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;
        let mut v1 = market.connect(&vendor("v1")).await;
        let id = c1.session.id();

        market.disconnect(&mut c1).await;
        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 12.90, "lng": 77.59 } }),
            )
            .await;

        let router = &market.container.router;
        assert!(router.channels_of(&id).is_empty());
        assert!(router.subscribers(&Channel::VendorFeed).is_empty());
        assert!(!router.is_registered(&id));
        assert!(!market.container.presence.is_online(&customer("c1")));

        // Mailbox is closed and empty once the router forgot the connection.
        assert!(c1.next(Duration::from_millis(50)).await.is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_connection_cannot_act() {
        let market = market();
        let supervisor = market.supervisor();
        let (mut session, mut mailbox) = supervisor.open();

        supervisor
            .process_message(
                &mut session,
                &json!({ "event": "get_all_vendor_locations" }).to_string(),
            )
            .await;

        let event = serde_json::to_value(mailbox.try_recv().unwrap().as_ref()).unwrap();
        assert_eq!(event["data"]["code"], "UNAUTHENTICATED");
        assert!(market.container.router.channels_of(&session.id()).is_empty());
    }

    #[tokio::test]
    async fn test_vendor_stays_online_until_last_connection_closes() {
        let market = market_with(|config| config.supervisor.presence.auto_offline = true);
        let v1 = vendor("v1");
        let mut phone = market.connect(&v1).await;
        let mut tablet = market.connect(&v1).await;
        let mut c1 = market.connect(&customer("c1")).await;

        market
            .send(
                &mut phone,
                json!({ "event": "set_online_status", "data": { "isOnline": true } }),
            )
            .await;
        assert_eq!(c1.expect_json().await["data"]["isOnline"], true);
        assert_eq!(market.container.presence.connections(&v1).len(), 2);

        market.disconnect(&mut phone).await;
        assert!(market.container.presence.is_online(&v1));
        assert!(market.container.locations.is_online(&VendorId::new("v1")));
        c1.assert_silent();

        market.disconnect(&mut tablet).await;
        let offline = c1.expect_json().await;
        assert_eq!(offline["event"], "vendor_status_changed");
        assert_eq!(offline["data"]["isOnline"], false);
        assert!(!market.container.locations.is_online(&VendorId::new("v1")));
        assert_eq!(market.container.presence.online_count(Role::Vendor), 0);
    }

    #[tokio::test]
    async fn test_stats_follow_connections() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;
        let _v1 = market.connect(&Identity::Vendor(VendorId::new("v1"))).await;

        let stats = market.supervisor().stats();
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.online_customers, 1);
        assert_eq!(stats.online_vendors, 1);
        assert_eq!(stats.subscriptions, 4);

        market.disconnect(&mut c1).await;
        let stats = market.supervisor().stats();
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.sessions.connections_closed, 1);
    }
}

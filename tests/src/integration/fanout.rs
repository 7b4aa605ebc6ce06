//! # Fan-out Under Back-pressure
//!
//! One unresponsive subscriber must not hold up the rest of a channel:
//! it is given the delivery timeout, then dropped and told it lagged.

#[cfg(test)]
mod tests {
    use crate::fixtures::{customer, market_with, vendor, Client};
    use serde_json::json;
    use shared_bus::connection_channel;
    use shared_types::{Channel, ConnectionId, ServerEvent};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::time::timeout;

    const DELIVERY_TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_unresponsive_subscriber_does_not_block_feed() {
        let market = market_with(|config| config.supervisor.delivery.timeout = DELIVERY_TIMEOUT);
        let router = market.container.router.clone();

        let mut feed: Vec<Client> = Vec::with_capacity(99);
        for n in 0..99 {
            feed.push(market.connect(&customer(&format!("c{n}"))).await);
        }

        // A subscriber whose single-slot mailbox is already full and never read.
        let stuck_id = ConnectionId::new();
        let (stuck, stuck_box) = connection_channel(stuck_id, 1);
        router.register(stuck.clone());
        router.subscribe(&stuck_id, Channel::VendorFeed).unwrap();
        stuck
            .deliver(Arc::new(ServerEvent::AllVendorLocations(Vec::new())), DELIVERY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(router.subscribers(&Channel::VendorFeed).len(), 100);

        let mut v1 = market.connect(&vendor("v1")).await;
        let started = Instant::now();
        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 12.90, "lng": 77.59 } }),
            )
            .await;
        let elapsed = started.elapsed();

        for client in &mut feed {
            let event = client.expect_json().await;
            assert_eq!(event["event"], "vendor_moved");
            assert_eq!(event["data"]["vendorId"], "v1");
        }
        assert!(
            elapsed < DELIVERY_TIMEOUT * 10,
            "publish took {elapsed:?} with one stuck subscriber"
        );

        assert!(!router.is_subscribed(&stuck_id, &Channel::VendorFeed));
        assert_eq!(router.subscribers(&Channel::VendorFeed).len(), 99);
        assert_eq!(router.stats().dropped, 1);
        timeout(Duration::from_secs(1), stuck_box.lagged())
            .await
            .expect("stuck subscriber was not told it lagged");
    }

    #[tokio::test]
    async fn test_dropped_subscriber_misses_later_events() {
        let market = market_with(|config| config.supervisor.delivery.timeout = DELIVERY_TIMEOUT);
        let router = market.container.router.clone();
        let mut c1 = market.connect(&customer("c1")).await;
        let mut v1 = market.connect(&vendor("v1")).await;

        let stuck_id = ConnectionId::new();
        let (stuck, mut stuck_box) = connection_channel(stuck_id, 1);
        router.register(stuck.clone());
        router.subscribe(&stuck_id, Channel::VendorFeed).unwrap();
        stuck
            .deliver(Arc::new(ServerEvent::AllVendorLocations(Vec::new())), DELIVERY_TIMEOUT)
            .await
            .unwrap();

        for lat in [12.90, 12.91] {
            market
                .send(
                    &mut v1,
                    json!({ "event": "update_location", "data": { "lat": lat, "lng": 77.59 } }),
                )
                .await;
        }

        assert_eq!(c1.expect_json().await["data"]["lat"], 12.90);
        assert_eq!(c1.expect_json().await["data"]["lat"], 12.91);

        // Only the event that filled the mailbox is there.
        assert_eq!(stuck_box.drain().len(), 1);
        assert_eq!(router.stats().dropped, 1);
    }
}

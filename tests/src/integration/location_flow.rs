//! # Location Flow
//!
//! A vendor's socket pushes a position; the broadcaster stores it and the
//! room router fans it out to the global feed and the vendor's own room.

#[cfg(test)]
mod tests {
    use crate::fixtures::{customer, market, vendor};
    use cs_02_location_broadcaster::LocationApi;
    use serde_json::json;
    use shared_types::VendorId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_vendor_move_reaches_feed_subscribers() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut c1 = market.connect(&customer("c1")).await;
        let mut c2 = market.connect(&customer("c2")).await;

        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 12.90, "lng": 77.59 } }),
            )
            .await;

        for client in [&mut c1, &mut c2] {
            let event = client.expect_json().await;
            assert_eq!(event["event"], "vendor_moved");
            assert_eq!(event["data"]["vendorId"], "v1");
            assert_eq!(event["data"]["lat"], 12.90);
            assert_eq!(event["data"]["lng"], 77.59);
        }

        // The vendor's own room hears its move as well.
        assert_eq!(v1.expect_json().await["event"], "vendor_moved");

        assert_eq!(market.container.location_store.len(), 1);
    }

    #[tokio::test]
    async fn test_other_vendor_rooms_stay_quiet() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut v2 = market.connect(&vendor("v2")).await;

        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 12.91, "lng": 77.59 } }),
            )
            .await;

        assert_eq!(v1.expect_json().await["event"], "vendor_moved");
        assert!(v2.next(Duration::from_millis(50)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_position_is_reported_to_sender_only() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut c1 = market.connect(&customer("c1")).await;

        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 91.0, "lng": 77.59 } }),
            )
            .await;

        let event = v1.expect_json().await;
        assert_eq!(event["event"], "error");
        assert_eq!(event["data"]["code"], "INVALID_COORDINATE");
        c1.assert_silent();
        assert!(market.container.location_store.is_empty());
    }

    #[tokio::test]
    async fn test_customer_discovers_nearby_vendors() {
        let market = market();
        let mut near = market.connect(&vendor("near")).await;
        let mut far = market.connect(&vendor("far")).await;
        let mut c1 = market.connect(&customer("c1")).await;

        market
            .send(
                &mut near,
                json!({ "event": "update_location", "data": { "lat": 12.91, "lng": 77.59 } }),
            )
            .await;
        market
            .send(
                &mut far,
                json!({ "event": "update_location", "data": { "lat": 13.2, "lng": 77.59 } }),
            )
            .await;
        c1.mailbox.drain();

        market
            .send(
                &mut c1,
                json!({
                    "event": "customer_location",
                    "data": { "customerId": "c1", "lat": 12.90, "lng": 77.59 }
                }),
            )
            .await;

        let event = c1.expect_json().await;
        assert_eq!(event["event"], "nearby_vendors");
        let found = event["data"].as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["vendorId"], "near");
        assert_eq!(found[0]["distanceKm"], 1.11);
    }

    #[tokio::test]
    async fn test_online_status_flips_and_keeps_position() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut c1 = market.connect(&customer("c1")).await;

        market
            .send(
                &mut v1,
                json!({ "event": "update_location", "data": { "lat": 12.90, "lng": 77.59 } }),
            )
            .await;
        market
            .send(
                &mut v1,
                json!({ "event": "set_online_status", "data": { "isOnline": true } }),
            )
            .await;

        assert_eq!(c1.expect_json().await["event"], "vendor_moved");
        let status = c1.expect_json().await;
        assert_eq!(status["event"], "vendor_status_changed");
        assert_eq!(status["data"]["isOnline"], true);
        assert!(market.container.locations.is_online(&VendorId::new("v1")));

        market
            .send(&mut c1, json!({ "event": "get_all_vendor_locations" }))
            .await;
        let all = c1.expect_json().await;
        assert_eq!(all["event"], "all_vendor_locations");
        assert_eq!(all["data"][0]["vendorId"], "v1");
    }
}

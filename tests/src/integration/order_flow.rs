//! # Order Flow
//!
//! Placement announces `new_order` to the vendor's private order room; each accepted
//! transition announces `order_status_update` to the customer's room.

#[cfg(test)]
mod tests {
    use crate::fixtures::{customer, market, vendor, Market};
    use cs_03_order_sync::{is_valid_transition, NewOrder, OrderApi};
    use proptest::prelude::*;
    use serde_json::json;
    use shared_types::{OrderId, OrderItem, OrderStatus, VendorId};
    use std::time::Duration;

    fn tea() -> NewOrder {
        NewOrder::new(VendorId::new("v1"), vec![OrderItem::new("Tea", 20.0, 10)]).with_total(200.0)
    }

    async fn place_tea(market: &Market) -> OrderId {
        market
            .container
            .orders
            .create(&customer("c1"), tea())
            .await
            .unwrap()
            .order()
            .order_id
    }

    #[tokio::test]
    async fn test_placement_then_confirmation() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut c1 = market.connect(&customer("c1")).await;

        let order_id = place_tea(&market).await;

        let announced = v1.expect_json().await;
        assert_eq!(announced["event"], "new_order");
        assert_eq!(announced["data"]["total"], 200.0);
        assert_eq!(announced["data"]["status"], "pending");
        assert_eq!(announced["data"]["customerId"], "c1");
        c1.assert_silent();

        market
            .send(
                &mut v1,
                json!({
                    "event": "update_order_status",
                    "data": { "orderId": order_id.to_string(), "status": "confirmed" }
                }),
            )
            .await;

        let update = c1.expect_json().await;
        assert_eq!(update["event"], "order_status_update");
        assert_eq!(update["data"]["orderId"], order_id.to_string());
        assert_eq!(update["data"]["status"], "confirmed");

        let stored = market.container.orders.get(&order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_order_untouched() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        let mut c1 = market.connect(&customer("c1")).await;
        let order_id = place_tea(&market).await;
        v1.mailbox.drain();

        market
            .send(
                &mut v1,
                json!({
                    "event": "update_order_status",
                    "data": { "orderId": order_id.to_string(), "status": "delivered" }
                }),
            )
            .await;

        let error = v1.expect_json().await;
        assert_eq!(error["event"], "error");
        assert_eq!(error["data"]["code"], "INVALID_TRANSITION");
        c1.assert_silent();

        let stored = market.container.orders.get(&order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_other_vendor_cannot_advance_order() {
        let market = market();
        let mut v2 = market.connect(&vendor("v2")).await;
        let mut c1 = market.connect(&customer("c1")).await;
        let order_id = place_tea(&market).await;

        market
            .send(
                &mut v2,
                json!({
                    "event": "update_order_status",
                    "data": { "orderId": order_id.to_string(), "status": "confirmed" }
                }),
            )
            .await;

        assert_eq!(v2.expect_json().await["data"]["code"], "UNAUTHORIZED_MUTATION");
        c1.assert_silent();
    }

    #[tokio::test]
    async fn test_customer_may_cancel_pending_order() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;
        let order_id = place_tea(&market).await;

        market
            .send(
                &mut c1,
                json!({
                    "event": "update_order_status",
                    "data": { "orderId": order_id.to_string(), "status": "cancelled" }
                }),
            )
            .await;

        let update = c1.expect_json().await;
        assert_eq!(update["event"], "order_status_update");
        assert_eq!(update["data"]["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_store_outage_returns_local_order_without_announcing() {
        let market = market();
        let mut v1 = market.connect(&vendor("v1")).await;
        market.container.order_store.fail_writes(true);

        let placement = market
            .container
            .orders
            .create(&customer("c1"), tea())
            .await
            .unwrap();

        assert!(!placement.is_persisted());
        assert_eq!(placement.order().status, OrderStatus::Pending);
        assert_eq!(placement.order().total, 200.0);
        assert!(v1.next(Duration::from_millis(50)).await.is_none());
        assert!(market.container.order_store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_transitions_apply_once() {
        let market = market();
        let mut c1 = market.connect(&customer("c1")).await;
        let order_id = place_tea(&market).await;
        let orders = market.container.orders.clone();

        let attempts = (0..8).map(|_| {
            let orders = orders.clone();
            tokio::spawn(async move {
                orders
                    .transition(&order_id, OrderStatus::Confirmed, &vendor("v1"))
                    .await
            })
        });
        let mut accepted = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            if attempt.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(c1.expect_json().await["data"]["status"], "confirmed");
        c1.assert_silent();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Whatever the vendor asks for, the stored status only ever moves
        /// along a legal edge and the customer hears exactly the accepted moves.
        #[test]
        fn prop_stored_status_follows_state_graph(
            requests in proptest::collection::vec(
                proptest::sample::select(OrderStatus::ALL.to_vec()),
                1..8,
            )
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            runtime.block_on(async {
                let market = market();
                let mut c1 = market.connect(&customer("c1")).await;
                let order_id = place_tea(&market).await;

                let mut expected = OrderStatus::Pending;
                let mut accepted = Vec::new();
                for status in requests {
                    let result = market
                        .container
                        .orders
                        .transition(&order_id, status, &vendor("v1"))
                        .await;
                    assert_eq!(result.is_ok(), is_valid_transition(expected, status));
                    if result.is_ok() {
                        expected = status;
                        accepted.push(status);
                    }
                }

                let stored = market.container.orders.get(&order_id).await.unwrap();
                assert_eq!(stored.status, expected);

                let heard: Vec<String> = c1
                    .mailbox
                    .drain()
                    .iter()
                    .map(|event| serde_json::to_value(event.as_ref()).unwrap()["data"]["status"].to_string())
                    .collect();
                let wanted: Vec<String> = accepted
                    .iter()
                    .map(|status| serde_json::to_value(status).unwrap().to_string())
                    .collect();
                assert_eq!(heard, wanted);
            });
        }
    }
}

//! Integration tests for the order lifecycle.
//!
//! These tests drive the OrderService against the in-memory store and
//! verify numbering, status derivation, settlement and concurrency handling
//! end to end.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domain::{
    ChangeItemStatus, DomainError, InMemoryMenuCatalog, ManualClock, MenuItem, Money, OrderError,
    OrderItemStatus, OrderLine, OrderService, OrderStatus, PaymentDetails, PlaceOrder, ResumeOrder,
    TokenNumber,
};
use order_store::{InMemoryOrderStore, OrderQuery, OrderStore, Version};

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-15T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn menu() -> Arc<InMemoryMenuCatalog> {
    Arc::new(
        InMemoryMenuCatalog::new()
            .with_item(MenuItem::new("latte", "Latte", Money::from_major(150), "drinks"))
            .with_item(MenuItem::new("bagel", "Bagel", Money::from_major(90), "food"))
            .with_item(MenuItem::new("cola", "Cola", Money::from_major(60), "drinks")),
    )
}

/// Helper to create a test order service with a controllable clock
fn create_service(store: InMemoryOrderStore) -> (OrderService<InMemoryOrderStore>, ManualClock) {
    let clock = ManualClock::new(start());
    let service = OrderService::new(store, menu()).with_clock(Arc::new(clock.clone()));
    (service, clock)
}

fn latte_and_bagel() -> PlaceOrder {
    PlaceOrder::new(vec![OrderLine::new("latte", 2), OrderLine::new("bagel", 1)])
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_order_lifecycle() {
        let (service, _) = create_service(InMemoryOrderStore::new());

        let result = service
            .place_order(latte_and_bagel().at_table("T4", 2))
            .await
            .unwrap();
        let order = result.order;
        let order_id = order.id().unwrap();

        assert_eq!(order.total_amount(), Money::from_major(390));
        assert_eq!(order.order_number().unwrap().to_string(), "20240315-0001");
        assert_eq!(order.token().unwrap().to_string(), "001");
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(result.new_version, Version::first());

        let latte = order.items()[0].id;
        let bagel = order.items()[1].id;

        let step = |item_id, status| ChangeItemStatus::new(order_id, item_id, status);

        let r = service
            .change_item_status(step(latte, OrderItemStatus::Preparing))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::Preparing);

        let r = service
            .change_item_status(step(latte, OrderItemStatus::Ready))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::PartiallyReady);

        let r = service
            .change_item_status(step(bagel, OrderItemStatus::Ready))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::ReadyForDelivery);

        let r = service.mark_item_delivered(order_id, latte).await.unwrap();
        assert_eq!(r.order.status(), OrderStatus::DeliveryInProgress);

        let r = service.mark_item_delivered(order_id, bagel).await.unwrap();
        assert_eq!(r.order.status(), OrderStatus::Completed);
        assert_eq!(r.new_version, Version::new(6));
        assert_eq!(r.order.version(), r.new_version);
    }

    #[tokio::test]
    async fn late_ready_keeps_delivered_item() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();
        let latte = order.items()[0].id;

        service.mark_item_delivered(order_id, latte).await.unwrap();
        let result = service
            .change_item_status(ChangeItemStatus::new(order_id, latte, OrderItemStatus::Ready))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(
            result.order.item(latte).unwrap().status,
            OrderItemStatus::DeliveredToCustomer
        );
    }

    #[tokio::test]
    async fn cancelling_the_started_item_keeps_preparing() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();
        let latte = order.items()[0].id;

        let r = service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                latte,
                OrderItemStatus::Preparing,
            ))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::Preparing);

        // The bagel alone is still pending, but the order does not go back.
        let r = service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                latte,
                OrderItemStatus::Cancelled,
            ))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn cancelled_items_drop_out_of_derivation() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();
        let latte = order.items()[0].id;
        let bagel = order.items()[1].id;

        service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                bagel,
                OrderItemStatus::Cancelled,
            ))
            .await
            .unwrap();
        let r = service.mark_item_delivered(order_id, latte).await.unwrap();

        assert_eq!(r.order.status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_order() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();

        let r = service
            .cancel_order(order_id, Some("customer left".into()))
            .await
            .unwrap();
        assert_eq!(r.order.status(), OrderStatus::Cancelled);

        let result = service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                order.items()[0].id,
                OrderItemStatus::Preparing,
            ))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidStateTransition {
                current_status: OrderStatus::Cancelled,
                ..
            }))
        ));
    }
}

mod numbering {
    use super::*;

    #[tokio::test]
    async fn held_order_does_not_consume_a_token() {
        let (service, _) = create_service(InMemoryOrderStore::new());

        let held = service
            .place_order(latte_and_bagel().on_hold())
            .await
            .unwrap()
            .order;
        assert_eq!(held.token(), Some(TokenNumber::Held));
        assert_eq!(held.token().unwrap().to_string(), "HELD");
        assert_eq!(held.status(), OrderStatus::OnHold);

        let next = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        assert_eq!(next.token(), Some(TokenNumber::Issued(1)));
        assert_eq!(next.order_number().unwrap().sequence(), 2);
    }

    #[tokio::test]
    async fn numbering_restarts_on_a_new_day() {
        let (service, clock) = create_service(InMemoryOrderStore::new());

        service.place_order(latte_and_bagel()).await.unwrap();
        service.place_order(latte_and_bagel()).await.unwrap();

        clock.advance(Duration::days(1));
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;

        assert_eq!(order.order_number().unwrap().to_string(), "20240316-0001");
        assert_eq!(order.token(), Some(TokenNumber::Issued(1)));
    }

    #[tokio::test]
    async fn rejected_order_writes_nothing_and_burns_no_number() {
        let store = InMemoryOrderStore::new();
        let (service, _) = create_service(store.clone());

        let result = service
            .place_order(PlaceOrder::new(vec![
                OrderLine::new("latte", 1),
                OrderLine::new("bagel", 0),
            ]))
            .await;
        assert!(result.unwrap_err().is_validation());

        let result = service.place_order(PlaceOrder::new(vec![])).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::NoItems))
        ));

        assert_eq!(store.record_count().await, 0);
        assert!(store.get_counter("order-number:20240315").await.unwrap().is_none());

        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        assert_eq!(order.order_number().unwrap().sequence(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_terminals_never_share_a_number() {
        let store = InMemoryOrderStore::new();
        let (first, _) = create_service(store.clone());
        let (second, _) = create_service(store.clone());

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = if i % 2 == 0 { first.clone() } else { second.clone() };
            handles.push(tokio::spawn(async move {
                service.place_order(latte_and_bagel()).await.unwrap().order
            }));
        }

        let mut numbers = Vec::new();
        let mut tokens = Vec::new();
        for handle in handles {
            let order = handle.await.unwrap();
            numbers.push(order.order_number().unwrap().sequence());
            tokens.push(order.token().unwrap().to_string());
        }
        numbers.sort_unstable();
        tokens.sort();
        tokens.dedup();

        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
        assert_eq!(tokens.len(), 10);
        assert_eq!(store.record_count().await, 10);
    }
}

mod hold_and_resume {
    use super::*;

    #[tokio::test]
    async fn paid_hold_keeps_its_token_on_resume() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let held = service
            .place_order(latte_and_bagel().on_hold().paid_with(PaymentDetails::card()))
            .await
            .unwrap();
        assert_eq!(held.order.status(), OrderStatus::OnHold);
        assert_eq!(held.order.token(), Some(TokenNumber::Issued(1)));
        assert!(!held.settled());

        let resumed = service
            .resume_order(ResumeOrder::new(held.order.id().unwrap()))
            .await
            .unwrap();
        assert_eq!(resumed.order.token(), Some(TokenNumber::Issued(1)));
        assert!(resumed.settled());

        let next = service.place_order(latte_and_bagel()).await.unwrap();
        assert_eq!(next.order.token(), Some(TokenNumber::Issued(2)));
    }

    #[tokio::test]
    async fn resume_with_payment_settles_exactly_once() {
        let (service, clock) = create_service(InMemoryOrderStore::new());
        let held = service
            .place_order(latte_and_bagel().on_hold())
            .await
            .unwrap();
        assert!(!held.settled());
        let order_id = held.order.id().unwrap();

        clock.advance(Duration::minutes(5));
        let resumed = service
            .resume_order(ResumeOrder::new(order_id).paid_with(PaymentDetails::cash(
                Money::from_major(500),
            )))
            .await
            .unwrap();

        assert!(resumed.settled());
        assert_eq!(resumed.order.status(), OrderStatus::Pending);
        assert_eq!(resumed.order.token(), Some(TokenNumber::Issued(1)));
        assert_eq!(
            resumed.order.payment().change_given,
            Some(Money::from_major(110))
        );
        assert!(
            resumed.order.last_notified().unwrap() > held.order.last_notified().unwrap()
        );

        let item_id = resumed.order.items()[0].id;
        let later = service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                item_id,
                OrderItemStatus::Preparing,
            ))
            .await
            .unwrap();
        assert!(!later.settled());
    }

    #[tokio::test]
    async fn paid_placement_settles_immediately() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let result = service
            .place_order(latte_and_bagel().paid_with(PaymentDetails::card()))
            .await
            .unwrap();

        assert!(result.settled());
        assert!(result.order.settled_at().is_some());
    }

    #[tokio::test]
    async fn hold_is_refused_once_preparation_started() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();

        service
            .change_item_status(ChangeItemStatus::new(
                order_id,
                order.items()[0].id,
                OrderItemStatus::Preparing,
            ))
            .await
            .unwrap();

        assert!(service.hold_order(order_id).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn held_order_can_be_edited_then_resumed() {
        let (service, _) = create_service(InMemoryOrderStore::new());
        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();

        let held = service.hold_order(order_id).await.unwrap().order;
        assert_eq!(held.token(), Some(TokenNumber::Held));

        let edited = service
            .edit_held_order(domain::EditHeldOrder::new(
                order_id,
                vec![OrderLine::new("cola", 3)],
            ))
            .await
            .unwrap()
            .order;
        assert_eq!(edited.total_amount(), Money::from_major(180));

        let resumed = service
            .resume_order(ResumeOrder::new(order_id))
            .await
            .unwrap()
            .order;
        assert_eq!(resumed.token(), Some(TokenNumber::Issued(2)));
        assert!(!resumed.is_paid());
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn stale_writer_is_retried_on_fresh_state() {
        let store = InMemoryOrderStore::new();
        let (kitchen, _) = create_service(store.clone());
        let (counter, _) = create_service(store.clone());

        let order = kitchen
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let order_id = order.id().unwrap();
        let latte = order.items()[0].id;
        let bagel = order.items()[1].id;

        // Both terminals act on the same cached version.
        kitchen
            .change_item_status_from(order.clone(), latte, OrderItemStatus::Ready)
            .await
            .unwrap();
        let result = counter
            .change_item_status_from(order, bagel, OrderItemStatus::Ready)
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(3));
        let stored = kitchen.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(
            stored.item(latte).unwrap().status,
            OrderItemStatus::AwaitingDelivery
        );
        assert_eq!(
            stored.item(bagel).unwrap().status,
            OrderItemStatus::AwaitingDelivery
        );
        assert_eq!(stored.status(), OrderStatus::ReadyForDelivery);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_a_conflict() {
        let store = InMemoryOrderStore::new();
        let (service, _) = create_service(store.clone());
        let service = service.with_conflict_retries(0);

        let order = service
            .place_order(latte_and_bagel())
            .await
            .unwrap()
            .order;
        let latte = order.items()[0].id;

        service
            .change_item_status_from(order.clone(), latte, OrderItemStatus::Preparing)
            .await
            .unwrap();
        let result = service
            .change_item_status_from(order, latte, OrderItemStatus::Ready)
            .await;

        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn store_outage_is_reported_as_unavailable() {
        let store = InMemoryOrderStore::new();
        let (service, _) = create_service(store.clone());
        store.set_unavailable(true);

        let result = service.place_order(latte_and_bagel()).await;
        assert!(result.unwrap_err().is_unavailable());

        store.set_unavailable(false);
        assert!(service.place_order(latte_and_bagel()).await.is_ok());
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn list_orders_by_status() {
        let (service, clock) = create_service(InMemoryOrderStore::new());

        for _ in 0..3 {
            service.place_order(latte_and_bagel()).await.unwrap();
            clock.advance(Duration::seconds(1));
        }
        service
            .place_order(latte_and_bagel().on_hold())
            .await
            .unwrap();

        let held = service
            .list_orders(OrderQuery::new().status("ON_HOLD"))
            .await
            .unwrap();
        assert_eq!(held.len(), 1);

        let live = service
            .list_orders(OrderQuery::new().excluding_statuses(["ON_HOLD"]).oldest_first())
            .await
            .unwrap();
        assert_eq!(live.len(), 3);
        let sequences: Vec<_> = live
            .iter()
            .map(|o| o.order_number().unwrap().sequence())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}

//! Lifecycle integration tests.
//!
//! Exercises the event lifecycle manager against the in-memory ports:
//! capacity bounds (sequential and concurrent), set-semantics joins,
//! idempotent completion, participant-only awards, and the fire-and-forget
//! notification contract.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chrono::{Duration, Utc};
use gatherly_core::DomainError;
use gatherly_core::account::{Account, NewAccount};
use gatherly_core::event::{EventCategory, Location, NewEvent, PaymentTerms};
use gatherly_core::store::{AccountStore, EventStore};
use gatherly_core::types::AccountId;
use gatherly_server::lifecycle::EventLifecycle;
use gatherly_server::notify::NotificationDispatcher;
use gatherly_testing::{InMemoryStore, RecordingPushGateway, StubPaymentVerifier};
use std::sync::Arc;

fn harness(push: RecordingPushGateway) -> (Arc<EventLifecycle>, InMemoryStore) {
    let store = InMemoryStore::new();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(push),
    ));
    let lifecycle = Arc::new(EventLifecycle::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(StubPaymentVerifier::completing()),
        dispatcher,
    ));
    (lifecycle, store)
}

async fn signup(store: &InMemoryStore, n: u32) -> Account {
    AccountStore::insert(
        store,
        NewAccount {
            email: format!("user{n}@example.com"),
            password_hash: "$argon2id$stub".into(),
            first_name: "Test".into(),
            last_name: format!("User{n}"),
        },
    )
    .await
    .unwrap()
}

fn draft(capacity: u32) -> NewEvent {
    let start = Utc::now() + Duration::hours(1);
    NewEvent {
        title: "Falls hike".into(),
        description: "Trailhead meetup at dawn".into(),
        location: Location {
            address: "North trailhead".into(),
            lat: Some(27.7),
            lng: Some(85.3),
        },
        start_time: start,
        end_time: start + Duration::hours(4),
        max_participants: capacity,
        category: EventCategory::Sports,
        payment: PaymentTerms::default(),
        image_url: None,
    }
}

#[tokio::test]
async fn create_join_complete_happy_path() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;

    let details = lifecycle.create_event(host.id, draft(10)).await.unwrap();
    assert!(!details.event.is_completed);
    assert!(details.participants.is_empty());

    let details = lifecycle.join_event(details.event.id, guest.id).await.unwrap();
    assert_eq!(details.participants.len(), 1);
    assert_eq!(details.participants[0].id, guest.id);

    let outcome = lifecycle
        .complete_event(details.event.id, host.id, &[guest.id])
        .await
        .unwrap();
    assert!(outcome.newly_completed);
    assert_eq!(outcome.awarded, vec![guest.id]);
    assert_eq!(store.points_of(guest.id), 50);
}

#[tokio::test]
async fn rejected_draft_is_not_persisted() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;

    let mut new = draft(10);
    new.title = "   ".into();
    let result = lifecycle.create_event(host.id, new).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(store.notification_count(), 0);
}

#[tokio::test]
async fn joining_twice_is_rejected() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    let details = lifecycle.create_event(host.id, draft(10)).await.unwrap();

    lifecycle.join_event(details.event.id, guest.id).await.unwrap();
    let second = lifecycle.join_event(details.event.id, guest.id).await;
    assert!(matches!(second, Err(DomainError::AlreadyJoined)));
    assert_eq!(store.participants_of(details.event.id).len(), 1);
}

#[tokio::test]
async fn join_on_missing_event_is_not_found() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let guest = signup(&store, 1).await;

    let result = lifecycle
        .join_event(gatherly_core::EventId::new(), guest.id)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn concurrent_joins_cannot_exceed_capacity() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let a = signup(&store, 1).await;
    let b = signup(&store, 2).await;
    let details = lifecycle.create_event(host.id, draft(1)).await.unwrap();
    let event_id = details.event.id;

    let first = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move { lifecycle.join_event(event_id, a.id).await })
    };
    let second = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move { lifecycle.join_event(event_id, b.id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(DomainError::CapacityExceeded)))
        .count();
    assert_eq!(wins, 1, "exactly one concurrent join may succeed");
    assert_eq!(full, 1, "the loser must see a capacity error");
    assert_eq!(store.participants_of(event_id).len(), 1);
}

#[tokio::test]
async fn completion_is_idempotent() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();
    lifecycle.join_event(details.event.id, guest.id).await.unwrap();

    let first = lifecycle
        .complete_event(details.event.id, host.id, &[guest.id])
        .await
        .unwrap();
    let second = lifecycle
        .complete_event(details.event.id, host.id, &[guest.id])
        .await
        .unwrap();

    assert!(first.newly_completed);
    assert!(!second.newly_completed);
    assert!(second.awarded.is_empty());
    assert_eq!(store.points_of(guest.id), 50, "award applies exactly once");
}

#[tokio::test]
async fn awards_are_restricted_to_participants() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    let outsider = signup(&store, 2).await;
    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();
    lifecycle.join_event(details.event.id, guest.id).await.unwrap();

    // The host submits an outsider and a duplicate; neither mints points.
    let outcome = lifecycle
        .complete_event(
            details.event.id,
            host.id,
            &[outsider.id, guest.id, guest.id],
        )
        .await
        .unwrap();

    assert_eq!(outcome.awarded, vec![guest.id]);
    assert_eq!(store.points_of(guest.id), 50);
    assert_eq!(store.points_of(outsider.id), 0);
}

#[tokio::test]
async fn non_host_cannot_complete() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();

    let result = lifecycle
        .complete_event(details.event.id, guest.id, &[guest.id])
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    let event = store.fetch(details.event.id).await.unwrap().unwrap();
    assert!(!event.is_completed, "flag must be unchanged");
}

#[tokio::test]
async fn completed_events_accept_no_joins() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();
    lifecycle
        .complete_event(details.event.id, host.id, &[])
        .await
        .unwrap();

    let result = lifecycle.join_event(details.event.id, guest.id).await;
    assert!(matches!(result, Err(DomainError::EventCompleted)));
}

#[tokio::test]
async fn push_failure_never_fails_the_operation() {
    let push = RecordingPushGateway::failing();
    let (lifecycle, store) = harness(push.clone());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    store
        .set_push_token(guest.id, Some("token-guest".into()))
        .await
        .unwrap();
    store
        .set_push_token(host.id, Some("token-host".into()))
        .await
        .unwrap();

    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();
    lifecycle.join_event(details.event.id, guest.id).await.unwrap();

    // Delivery runs on detached tasks; give them a beat to fail.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(push.send_count() >= 1, "delivery was attempted");
    // One broadcast on create, two personal notifications on join.
    assert_eq!(store.notification_count(), 3);
    assert_eq!(store.participants_of(details.event.id), vec![guest.id]);
}

#[tokio::test]
async fn join_notifications_reach_joiner_and_host() {
    let push = RecordingPushGateway::new();
    let (lifecycle, store) = harness(push.clone());
    let host = signup(&store, 0).await;
    let guest = signup(&store, 1).await;
    store
        .set_push_token(host.id, Some("token-host".into()))
        .await
        .unwrap();
    store
        .set_push_token(guest.id, Some("token-guest".into()))
        .await
        .unwrap();

    let details = lifecycle.create_event(host.id, draft(5)).await.unwrap();
    lifecycle.join_event(details.event.id, guest.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let all_tokens: Vec<String> = push
        .sends()
        .into_iter()
        .flat_map(|send| send.tokens)
        .collect();
    assert!(all_tokens.contains(&"token-guest".to_string()));
    assert!(all_tokens.contains(&"token-host".to_string()));
}

#[tokio::test]
async fn capacity_holds_under_many_concurrent_joins() {
    let (lifecycle, store) = harness(RecordingPushGateway::new());
    let host = signup(&store, 0).await;
    let details = lifecycle.create_event(host.id, draft(3)).await.unwrap();
    let event_id = details.event.id;

    let mut joiners: Vec<AccountId> = Vec::new();
    for n in 1..=10 {
        joiners.push(signup(&store, n).await.id);
    }

    let handles: Vec<_> = joiners
        .into_iter()
        .map(|account| {
            let lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.join_event(event_id, account).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 3);
    assert_eq!(store.participants_of(event_id).len(), 3);
}

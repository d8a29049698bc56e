//! Integration tests for Store action broadcasting and cancellation
//!
//! Uses a small status-polling reducer: each poll feeds back the next poll
//! until the reference settles, the same shape the storefront uses for
//! mobile-money confirmation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use ticketplus_core::effect::{Effect, EffectId};
use ticketplus_core::reducer::Reducer;
use ticketplus_core::{smallvec, SmallVec};
use ticketplus_runtime::{Store, StoreError};

// ============================================================================
// Test Fixtures
// ============================================================================

const POLL: EffectId = EffectId::new("status-poll");

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start polling a payment reference
    StartPolling { reference: u64 },
    /// One poll finished
    Polled { reference: u64, attempt: u32 },
    /// Terminal: the reference settled
    Settled { reference: u64 },
    /// Stop polling
    StopPolling,
    /// Simple increment command
    Increment,
    /// Incremented feedback
    Incremented { value: u32 },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    counter: u32,
    polls: Vec<(u64, u32)>,
}

#[derive(Clone)]
struct TestEnvironment {
    settle_after: u32,
}

#[derive(Clone)]
struct TestReducer;

fn poll(reference: u64, attempt: u32) -> Effect<TestAction> {
    Effect::Delay {
        duration: Duration::from_millis(10),
        action: Box::new(TestAction::Polled { reference, attempt }),
    }
    .cancellable(POLL)
}

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::StartPolling { reference } => {
                state.polls.clear();
                smallvec![poll(reference, 1)]
            },
            TestAction::Polled { reference, attempt } => {
                state.polls.push((reference, attempt));
                if attempt < env.settle_after {
                    smallvec![poll(reference, attempt + 1)]
                } else {
                    smallvec![Effect::future(async move {
                        Some(TestAction::Settled { reference })
                    })]
                }
            },
            TestAction::StopPolling => smallvec![Effect::Cancel(POLL)],
            TestAction::Settled { .. } | TestAction::Incremented { .. } => smallvec![Effect::None],
            TestAction::Increment => {
                state.counter += 1;
                let value = state.counter;
                smallvec![Effect::future(async move { Some(TestAction::Incremented { value }) })]
            },
        }
    }
}

fn store(settle_after: u32) -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment { settle_after })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_send_and_wait_for_immediate() {
    let store = store(3);

    let result = store
        .send_and_wait_for(
            TestAction::Increment,
            |action| matches!(action, TestAction::Incremented { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Incremented { value: 1 });
}

#[tokio::test(start_paused = true)]
async fn test_send_and_wait_for_polling_loop() {
    let store = store(3);

    let result = store
        .send_and_wait_for(
            TestAction::StartPolling { reference: 42 },
            |action| matches!(action, TestAction::Settled { reference: 42 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Settled { reference: 42 });
    let polls = store.state(|s| s.polls.clone()).await;
    assert_eq!(polls, vec![(42, 1), (42, 2), (42, 3)]);
}

#[tokio::test(start_paused = true)]
async fn test_send_and_wait_for_timeout() {
    let store = store(1_000);

    let result = store
        .send_and_wait_for(
            TestAction::StartPolling { reference: 7 },
            |action| matches!(action, TestAction::Settled { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_self_rescheduling_loop() {
    let store = store(1_000);

    store.send(TestAction::StartPolling { reference: 9 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;
    store.send(TestAction::StopPolling).await.unwrap();

    let polls_at_cancel = store.state(|s| s.polls.len()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(store.state(|s| s.polls.len()).await, polls_at_cancel);
    assert!(!store.is_running(&POLL));
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_running_loop() {
    let store = store(1_000);

    store.send(TestAction::StartPolling { reference: 1 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    store.send(TestAction::StartPolling { reference: 2 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(45)).await;
    store.send(TestAction::StopPolling).await.unwrap();

    let polls = store.state(|s| s.polls.clone()).await;
    assert!(!polls.is_empty());
    assert!(polls.iter().all(|(reference, _)| *reference == 2));
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_actions_streaming() {
    let store = Arc::new(store(2));
    let mut rx = store.subscribe_actions();

    store.send(TestAction::StartPolling { reference: 100 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut received = Vec::new();
    while let Ok(action) = rx.try_recv() {
        received.push(action);
    }

    assert_eq!(
        received,
        vec![
            TestAction::Polled { reference: 100, attempt: 1 },
            TestAction::Polled { reference: 100, attempt: 2 },
            TestAction::Settled { reference: 100 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_lagging_subscriber() {
    let store = Store::with_broadcast_capacity(
        TestState::default(),
        TestReducer,
        TestEnvironment { settle_after: 1 },
        4,
    );
    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        store.send(TestAction::Increment).await.ok();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut received = 0;
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => lagged = true,
            Err(_) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert!(received > 0 && received < 20);
}

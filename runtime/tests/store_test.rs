//! Integration tests for the Store
//!
//! A small request/response reducer exercises dispatch, effect feedback,
//! delayed actions, action observation and shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use cyclecare_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use cyclecare_runtime::{Store, StoreError};
use cyclecare_testing::init_test_tracing;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum FetchAction {
    /// Start a fetch for `id`
    Fetch { id: u32 },
    /// Fetch came back
    Fetched { id: u32, body: String },
    /// Show a notice that hides itself
    Flash(String),
    /// Hide the notice
    Unflash,
    /// Fetch a batch, one after the other
    FetchAll(Vec<u32>),
}

#[derive(Debug, Clone, Default)]
struct FetchState {
    in_flight: u32,
    bodies: Vec<(u32, String)>,
    notice: Option<String>,
}

#[derive(Clone)]
struct FetchEnvironment {
    latency: Duration,
}

#[derive(Clone)]
struct FetchReducer;

impl Reducer for FetchReducer {
    type State = FetchState;
    type Action = FetchAction;
    type Environment = FetchEnvironment;

    fn reduce(
        &self,
        state: &mut FetchState,
        action: FetchAction,
        env: &FetchEnvironment,
    ) -> SmallVec<[Effect<FetchAction>; 4]> {
        match action {
            FetchAction::Fetch { id } => {
                state.in_flight += 1;
                let latency = env.latency;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(latency).await;
                    Some(FetchAction::Fetched {
                        id,
                        body: format!("body-{id}"),
                    })
                })]
            },
            FetchAction::Fetched { id, body } => {
                state.in_flight -= 1;
                state.bodies.push((id, body));
                smallvec![Effect::None]
            },
            FetchAction::Flash(message) => {
                state.notice = Some(message);
                smallvec![Effect::Delay {
                    duration: Duration::from_secs(5),
                    action: Box::new(FetchAction::Unflash),
                }]
            },
            FetchAction::Unflash => {
                state.notice = None;
                smallvec![Effect::None]
            },
            FetchAction::FetchAll(ids) => {
                let steps = ids
                    .into_iter()
                    .map(|id| {
                        Effect::future(async move { Some(FetchAction::Fetch { id }) })
                    })
                    .collect();
                smallvec![Effect::Sequential(steps)]
            },
        }
    }
}

fn store(latency: Duration) -> Store<FetchState, FetchAction, FetchEnvironment, FetchReducer> {
    init_test_tracing();
    Store::new(FetchState::default(), FetchReducer, FetchEnvironment { latency })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn wait_covers_effect_feedback() {
    let store = store(Duration::from_millis(5));

    let mut handle = store.send(FetchAction::Fetch { id: 1 }).await.unwrap();
    assert_eq!(store.state(|s| s.in_flight).await, 1);

    handle.wait().await;
    let bodies = store.state(|s| s.bodies.clone()).await;
    assert_eq!(bodies, vec![(1, "body-1".to_string())]);
    assert_eq!(store.state(|s| s.in_flight).await, 0);
}

#[tokio::test]
async fn send_and_wait_for_returns_matching_action() {
    let store = store(Duration::from_millis(5));

    let action = store
        .send_and_wait_for(
            FetchAction::Fetch { id: 7 },
            |a| matches!(a, FetchAction::Fetched { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(
        action,
        FetchAction::Fetched {
            id: 7,
            body: "body-7".to_string()
        }
    );
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = store(Duration::from_secs(10));

    let result = store
        .send_and_wait_for(
            FetchAction::Fetch { id: 1 },
            |a| matches!(a, FetchAction::Fetched { .. }),
            Duration::from_millis(20),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn delayed_action_fires_after_its_duration() {
    let store = store(Duration::ZERO);

    let mut handle = store.send(FetchAction::Flash("Saved".to_string())).await.unwrap();
    assert_eq!(store.state(|s| s.notice.clone()).await.as_deref(), Some("Saved"));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(store.state(|s| s.notice.is_some()).await);

    handle.wait().await;
    assert_eq!(store.state(|s| s.notice.clone()).await, None);
}

#[tokio::test]
async fn sequential_effects_run_in_order() {
    let store = store(Duration::from_millis(1));

    let mut handle = store.send(FetchAction::FetchAll(vec![3, 1, 2])).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    let ids: Vec<u32> = store.state(|s| s.bodies.iter().map(|(id, _)| *id).collect()).await;
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn observers_see_effect_actions() {
    let store = store(Duration::ZERO);
    let mut rx = store.subscribe_actions();

    store.send(FetchAction::Fetch { id: 4 }).await.unwrap().wait().await;

    let observed = rx.recv().await.unwrap();
    assert!(matches!(observed, FetchAction::Fetched { id: 4, .. }));
}

#[tokio::test]
async fn shutdown_rejects_new_actions() {
    let store = store(Duration::ZERO);
    store.shutdown();

    let result = store.send(FetchAction::Fetch { id: 1 }).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    assert_eq!(store.state(|s| s.in_flight).await, 0);
}

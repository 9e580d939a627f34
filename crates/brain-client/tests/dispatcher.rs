mod common;

use std::sync::Arc;
use std::time::Duration;

use aether_brain_client::{ExchangeError, Method, RequestDispatcher};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{dead_endpoint, StubBrain};
use serde_json::{json, Value};

/// `/vibe` answers after `delay_ms` from the request body, echoing `tag`.
fn stub_routes() -> Router {
    Router::new()
        .route(
            "/vibe",
            post(|Json(body): Json<Value>| async move {
                let delay = body["delay_ms"].as_u64().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Json(json!({"prompt": body["tag"]}))
            }),
        )
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
}

async fn wait_until_in_flight(dispatcher: &RequestDispatcher) {
    for _ in 0..100 {
        if dispatcher.is_tracked_in_flight() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("tracked exchange never started");
}

#[tokio::test]
async fn tracked_exchange_clears_slot_on_completion() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher = RequestDispatcher::new(stub.endpoint());

    let value = dispatcher
        .tracked(Method::Post, "/vibe", Some(json!({"tag": "done"})))
        .await
        .unwrap();

    assert_eq!(value["prompt"], "done");
    assert!(!dispatcher.is_tracked_in_flight());
    assert!(!dispatcher.cancel());
}

#[tokio::test]
async fn cancel_aborts_tracked_exchange() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher = Arc::new(RequestDispatcher::new(stub.endpoint()));

    let running = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .tracked(Method::Post, "/vibe", Some(json!({"delay_ms": 5000, "tag": "slow"})))
                .await
        })
    };
    wait_until_in_flight(&dispatcher).await;

    assert!(dispatcher.cancel());
    assert!(!dispatcher.is_tracked_in_flight());

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("canceled exchange should resolve promptly")
        .unwrap();
    let err = result.unwrap_err();
    assert_eq!(err, ExchangeError::Network("request canceled".to_string()));
    assert_eq!(err.user_message(), "Request canceled.");
}

#[tokio::test]
async fn cancel_only_reaches_the_latest_tracked_exchange() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher = Arc::new(RequestDispatcher::new(stub.endpoint()));

    let first = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .tracked(Method::Post, "/vibe", Some(json!({"delay_ms": 400, "tag": "first"})))
                .await
        })
    };
    wait_until_in_flight(&dispatcher).await;

    let second = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .tracked(Method::Post, "/vibe", Some(json!({"delay_ms": 5000, "tag": "second"})))
                .await
        })
    };
    // Let the second exchange take over the slot.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(dispatcher.cancel());

    let second = second.await.unwrap();
    assert_eq!(
        second,
        Err(ExchangeError::Network("request canceled".to_string()))
    );

    let first = first.await.unwrap().unwrap();
    assert_eq!(first["prompt"], "first");
    assert!(!dispatcher.is_tracked_in_flight());
    assert!(!dispatcher.cancel());
}

#[tokio::test]
async fn tracked_timeout_is_configurable() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher =
        RequestDispatcher::new(stub.endpoint()).with_tracked_timeout(Duration::from_millis(150));

    let result = dispatcher
        .tracked(Method::Post, "/vibe", Some(json!({"delay_ms": 3000})))
        .await;

    assert_eq!(result, Err(ExchangeError::Timeout { timeout_ms: 150 }));
    assert!(!dispatcher.is_tracked_in_flight());
}

#[tokio::test]
async fn fire_and_forget_leaves_tracked_slot_alone() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher = Arc::new(RequestDispatcher::new(stub.endpoint()));

    let tracked = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .tracked(Method::Post, "/vibe", Some(json!({"delay_ms": 300, "tag": "tracked"})))
                .await
        })
    };
    wait_until_in_flight(&dispatcher).await;

    let health = dispatcher
        .fire_and_forget(Method::Get, "/health", None, Duration::from_secs(2), None)
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert!(dispatcher.is_tracked_in_flight());

    assert_eq!(tracked.await.unwrap().unwrap()["prompt"], "tracked");
}

#[tokio::test]
async fn endpoint_override_targets_another_address() {
    let stub = StubBrain::spawn(stub_routes()).await;
    let dispatcher = RequestDispatcher::new(dead_endpoint().await);

    let configured = dispatcher
        .fire_and_forget(Method::Get, "/health", None, Duration::from_secs(2), None)
        .await;
    assert!(matches!(configured, Err(ExchangeError::Network(_))));

    let overridden = dispatcher
        .fire_and_forget(
            Method::Get,
            "/health",
            None,
            Duration::from_secs(2),
            Some(&stub.endpoint()),
        )
        .await
        .unwrap();
    assert_eq!(overridden["status"], "ok");
    assert_ne!(dispatcher.endpoint(), stub.endpoint());
}

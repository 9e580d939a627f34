mod common;

use std::convert::Infallible;
use std::time::Duration;

use aether_brain_client::stream::PULL_FAILED_MESSAGE;
use aether_brain_client::{BrainClient, ExchangeError, ProgressEvent, PullOutcome};
use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use common::StubBrain;
use futures_util::StreamExt;
use serde_json::{json, Value};

fn event_stream(chunks: Vec<&'static str>, pause: Duration) -> Response {
    let body = futures_util::stream::iter(chunks).then(move |chunk| async move {
        tokio::time::sleep(pause).await;
        Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
    });
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(body),
    )
        .into_response()
}

async fn pull(Json(body): Json<Value>) -> Response {
    match body["model"].as_str().unwrap_or_default() {
        "gemma3:4b" => event_stream(
            vec![
                "data: {\"status\":\"pulling manifest\",\"pct\":0}\n",
                "\ndata: {\"status\":\"downloading\",\"pc",
                "t\":42.5}\n\ndata: {\"status\":\"downloading\",\"pct\":100}\n\n",
                "data: {\"status\":\"done\",\"pct\":100}\n\n",
            ],
            Duration::from_millis(10),
        ),
        "broken-model" => event_stream(
            vec![
                "data: {\"status\":\"pulling manifest\",\"pct\":0}\n\n",
                "data: {\"status\":\"error\",\"message\":\"file does not exist\"}\n\n",
            ],
            Duration::from_millis(10),
        ),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "unknown model"})),
        )
            .into_response(),
    }
}

async fn client() -> (StubBrain, BrainClient) {
    let stub = StubBrain::spawn(Router::new().route("/models/pull", post(pull))).await;
    let client = BrainClient::new(stub.endpoint());
    (stub, client)
}

#[tokio::test]
async fn progress_is_reported_in_order_and_pull_succeeds() {
    let (_stub, client) = client().await;
    let mut events = Vec::new();

    let outcome = client
        .pull_model("gemma3:4b", |event| events.push(event))
        .await
        .unwrap();

    assert_eq!(outcome, PullOutcome::ok("gemma3:4b"));
    let pcts: Vec<f64> = events.iter().map(|e: &ProgressEvent| e.pct).collect();
    assert_eq!(pcts, vec![0.0, 42.5, 100.0, 100.0]);
    assert_eq!(events[1].status, "downloading");
    assert_eq!(events[3].status, "done");
}

#[tokio::test]
async fn error_status_fails_the_pull() {
    let (_stub, client) = client().await;
    let mut events = Vec::new();

    let outcome = client
        .pull_model("broken-model", |event| events.push(event))
        .await
        .unwrap();

    assert!(!outcome.is_ok());
    assert_eq!(outcome.message.as_deref(), Some(PULL_FAILED_MESSAGE));
    assert_eq!(outcome.model, None);
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn rejected_pull_is_remote_error() {
    let (_stub, client) = client().await;

    let result = client.pull_model("no-such-model", |_| {}).await;

    assert_eq!(
        result,
        Err(ExchangeError::Remote {
            status: 422,
            message: "unknown model".to_string()
        })
    );
}

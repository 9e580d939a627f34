mod common;

use aether_brain_client::BrainClient;
use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use common::StubBrain;
use serde_json::{json, Value};

async fn category(Path(category): Path<String>) -> Json<Value> {
    let (patterns, enhancements) = if category == "debugging" {
        (
            json!([{
                "name": "Debugging Assistant",
                "role": "You are an expert debugger",
                "task_template": "Find the root cause of {error}",
                "capabilities": ["root cause analysis"],
                "rules": ["Reproduce before fixing"],
                "output_format": "numbered steps"
            }]),
            json!({
                "must_include": ["Error analysis and root cause identification"],
                "output_sections": ["Root Cause", "Fix"]
            }),
        )
    } else {
        (json!([]), json!({}))
    };
    Json(json!({
        "category": category,
        "patterns": patterns,
        "enhancements": enhancements,
    }))
}

fn knowledge_routes() -> Router {
    Router::new().route("/knowledge-base/{category}", get(category))
}

#[tokio::test]
async fn knowledge_category_fetches_patterns_for_one_category() {
    let stub = StubBrain::spawn(knowledge_routes()).await;
    let client = BrainClient::new(stub.endpoint());

    let response = client.knowledge_category("debugging").await.unwrap();

    assert_eq!(response.category, "debugging");
    assert_eq!(response.patterns.len(), 1);
    assert_eq!(response.patterns[0].rules, vec!["Reproduce before fixing"]);
    assert_eq!(response.enhancements.output_sections, vec!["Root Cause", "Fix"]);
}

#[tokio::test]
async fn unknown_category_comes_back_empty() {
    let stub = StubBrain::spawn(knowledge_routes()).await;
    let client = BrainClient::new(stub.endpoint());

    let response = client.knowledge_category("poetry").await.unwrap();

    assert_eq!(response.category, "poetry");
    assert!(response.patterns.is_empty());
    assert!(response.enhancements.must_include.is_empty());
}

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::types::{
    AgentsResponse, CatalogResponse, KnowledgeBase, KnowledgeCategory, ModelsResponse,
    OptimizeRequest, OptimizeResponse, PromptResponse, ScoreResponse, SelectModelResponse,
    VibeRequest,
};
use crate::connectivity::ConnectivityMonitor;
use crate::dispatcher::RequestDispatcher;
use crate::endpoint::Endpoint;
use crate::error::ExchangeError;
use crate::stream::{ProgressEvent, PullOutcome, StreamIngester};
use crate::transport::Method;

const AGENTS_TIMEOUT: Duration = Duration::from_secs(5);
const MODELS_TIMEOUT: Duration = Duration::from_secs(10);
const SELECT_MODEL_TIMEOUT: Duration = Duration::from_secs(5);
const CATALOG_TIMEOUT: Duration = Duration::from_secs(15);
pub const PULL_TIMEOUT: Duration = Duration::from_secs(600);
const SCORE_TIMEOUT: Duration = Duration::from_secs(10);
const OPTIMIZE_TIMEOUT: Duration = Duration::from_secs(15);
const KNOWLEDGE_BASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed operations against the Brain.
///
/// Cheap to clone; clones share the dispatcher, so a generation started
/// through one clone can be canceled through another.
#[derive(Clone)]
pub struct BrainClient {
    dispatcher: Arc<RequestDispatcher>,
    monitor: Arc<ConnectivityMonitor>,
}

impl BrainClient {
    pub fn new(endpoint: Endpoint) -> Self {
        let dispatcher = Arc::new(RequestDispatcher::new(endpoint));
        let monitor = Arc::new(ConnectivityMonitor::new(dispatcher.clone()));
        Self {
            dispatcher,
            monitor,
        }
    }

    /// Client over an already configured monitor (and its dispatcher).
    pub fn with_monitor(monitor: Arc<ConnectivityMonitor>) -> Self {
        Self {
            dispatcher: monitor.dispatcher().clone(),
            monitor,
        }
    }

    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn endpoint(&self) -> Endpoint {
        self.dispatcher.endpoint()
    }

    /// Probe the Brain, rediscovering it on a nearby port if needed.
    pub async fn health_check(&self) -> bool {
        self.monitor.health_check().await
    }

    /// Generate a prompt. This is the tracked exchange; see
    /// [`cancel_generation`](Self::cancel_generation).
    pub async fn generate(&self, request: &VibeRequest) -> Result<PromptResponse, ExchangeError> {
        info!(
            "Generating prompt (agent '{}', {} chars)",
            request.agent,
            request.vibe.chars().count()
        );
        let body = to_body(request)?;
        let value = self.dispatcher.tracked(Method::Post, "/vibe", Some(body)).await?;
        let response: PromptResponse = decode(value)?;

        if response.security_verdict != "PASS" {
            warn!("Generation returned security verdict {}", response.security_verdict);
        }
        debug!(
            "Generated {} chars in {} ms with {}",
            response.prompt.len(),
            response.generation_time_ms,
            response.model_used
        );
        Ok(response)
    }

    /// Abort the in-flight generation, if any. Returns whether one was aborted.
    pub fn cancel_generation(&self) -> bool {
        self.dispatcher.cancel()
    }

    pub fn is_generating(&self) -> bool {
        self.dispatcher.is_tracked_in_flight()
    }

    pub async fn list_agents(&self) -> Result<AgentsResponse, ExchangeError> {
        self.get("/agents", AGENTS_TIMEOUT).await
    }

    pub async fn list_models(&self) -> Result<ModelsResponse, ExchangeError> {
        let response: ModelsResponse = self.get("/models", MODELS_TIMEOUT).await?;
        if let Some(error) = &response.error {
            warn!("Brain could not list installed models: {}", error);
        }
        Ok(response)
    }

    pub async fn select_model(&self, model: &str) -> Result<SelectModelResponse, ExchangeError> {
        info!("Selecting model '{}'", model);
        self.post("/model", json!({ "model": model }), SELECT_MODEL_TIMEOUT)
            .await
    }

    pub async fn catalog(&self) -> Result<CatalogResponse, ExchangeError> {
        self.get("/models/available", CATALOG_TIMEOUT).await
    }

    /// Download a model, reporting progress to `on_progress` as units arrive.
    ///
    /// Exchange failures (including a timeout mid-stream) are errors; the
    /// outcome is only derived from a stream that ended cleanly.
    pub async fn pull_model<F>(
        &self,
        model: &str,
        mut on_progress: F,
    ) -> Result<PullOutcome, ExchangeError>
    where
        F: FnMut(ProgressEvent),
    {
        info!("Pulling model '{}'", model);
        let mut ingester = StreamIngester::new();

        self.dispatcher
            .fire_and_forget_stream(
                Method::Post,
                "/models/pull",
                Some(json!({ "model": model })),
                PULL_TIMEOUT,
                |chunk| ingester.feed(chunk, &mut on_progress),
            )
            .await?;

        let outcome = ingester.finish(model);
        if outcome.is_ok() {
            info!("Pull of '{}' finished", model);
        } else {
            warn!("Pull of '{}' failed", model);
        }
        Ok(outcome)
    }

    pub async fn score_prompt(&self, prompt: &str) -> Result<ScoreResponse, ExchangeError> {
        self.post("/prompt/score", json!({ "prompt": prompt }), SCORE_TIMEOUT)
            .await
    }

    pub async fn optimize_prompt(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizeResponse, ExchangeError> {
        let body = to_body(request)?;
        let response: OptimizeResponse = self.post("/prompt/optimize", body, OPTIMIZE_TIMEOUT).await?;
        if !response.sanitized_issues.is_empty() {
            debug!(
                "Brain sanitized {} issues in optimized prompt",
                response.sanitized_issues.len()
            );
        }
        Ok(response)
    }

    pub async fn knowledge_base(&self) -> Result<KnowledgeBase, ExchangeError> {
        self.get("/knowledge-base", KNOWLEDGE_BASE_TIMEOUT).await
    }

    /// Patterns and enhancement rules for one category. An unknown category
    /// comes back empty rather than as an error.
    pub async fn knowledge_category(
        &self,
        category: &str,
    ) -> Result<KnowledgeCategory, ExchangeError> {
        let path = knowledge_category_path(category);
        self.get(&path, KNOWLEDGE_BASE_TIMEOUT).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T, ExchangeError> {
        let value = self
            .dispatcher
            .fire_and_forget(Method::Get, path, None, timeout, None)
            .await?;
        decode(value)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
        timeout: Duration,
    ) -> Result<T, ExchangeError> {
        let value = self
            .dispatcher
            .fire_and_forget(Method::Post, path, Some(body), timeout, None)
            .await?;
        decode(value)
    }
}

/// Decode a JSON value into the expected response shape.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value).map_err(|e| {
        debug!("Unexpected response shape: {}", e);
        ExchangeError::InvalidResponse(e.to_string())
    })
}

fn knowledge_category_path(category: &str) -> String {
    format!("/knowledge-base/{}", category.trim().trim_matches('/'))
}

fn to_body<T: serde::Serialize>(request: &T) -> Result<Value, ExchangeError> {
    serde_json::to_value(request).map_err(|e| ExchangeError::InvalidResponse(e.to_string()))
}

//! Single request/response exchanges against the Brain.
//!
//! This module handles:
//! - Building JSON requests (content type, length and accept headers)
//! - Classifying responses into decoded JSON or an [`ExchangeError`]
//! - Enforcing the per-exchange timeout
//! - Pumping event-stream bodies chunk by chunk

use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::ExchangeError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Characters of a raw error body kept when it carries no `detail`.
const REMOTE_BODY_PREVIEW_CHARS: usize = 300;
/// Characters of a raw success body kept when it is not JSON.
const INVALID_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Method {
    #[strum(serialize = "GET")]
    Get,
    #[strum(serialize = "POST")]
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// What the exchange asks the server to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accept {
    #[default]
    Json,
    EventStream,
}

impl Accept {
    fn header_value(self) -> &'static str {
        match self {
            Accept::Json => JSON_CONTENT_TYPE,
            Accept::EventStream => EVENT_STREAM_CONTENT_TYPE,
        }
    }
}

/// One logical request. Lives only for the duration of one call.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub accept: Accept,
    /// Whether the dispatcher exposes this exchange to `cancel()`.
    pub tracked: bool,
}

impl Exchange {
    pub fn new(method: Method, path: &str, body: Option<Value>, timeout: Duration) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            timeout,
            accept: Accept::Json,
            tracked: false,
        }
    }

    pub fn event_stream(mut self) -> Self {
        self.accept = Accept::EventStream;
        self
    }

    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Thin wrapper over a pooled HTTP client. Holds no per-exchange state.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    /// Pooled client that bypasses system proxy settings.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client ({}); using defaults", e);
                reqwest::Client::new()
            });
        Self { http }
    }

    /// Perform one exchange and decode the JSON response.
    ///
    /// When the timeout fires the in-flight request future is dropped, which
    /// closes the underlying connection.
    pub async fn execute(
        &self,
        exchange: &Exchange,
        endpoint: &Endpoint,
    ) -> Result<Value, ExchangeError> {
        debug!(
            "{} {} (timeout {} ms{})",
            exchange.method,
            endpoint.url_for(&exchange.path),
            exchange.timeout_ms(),
            if exchange.tracked { ", tracked" } else { "" }
        );

        match tokio::time::timeout(exchange.timeout, self.round_trip(exchange, endpoint)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} {} timed out after {} ms",
                    exchange.method,
                    exchange.path,
                    exchange.timeout_ms()
                );
                Err(ExchangeError::Timeout {
                    timeout_ms: exchange.timeout_ms(),
                })
            }
        }
    }

    /// Perform one streaming exchange, handing each body chunk to `on_chunk`
    /// as it arrives. The timeout covers the whole stream, not just the headers.
    pub async fn stream<F>(
        &self,
        exchange: &Exchange,
        endpoint: &Endpoint,
        mut on_chunk: F,
    ) -> Result<(), ExchangeError>
    where
        F: FnMut(&[u8]),
    {
        debug!(
            "{} {} (streaming, timeout {} ms)",
            exchange.method,
            endpoint.url_for(&exchange.path),
            exchange.timeout_ms()
        );

        let pump = async {
            let response = self
                .build_request(exchange, endpoint)
                .send()
                .await
                .map_err(network_error)?;

            let status = response.status().as_u16();
            if status >= 400 {
                let body = response.text().await.map_err(network_error)?;
                return Err(remote_error(status, &body));
            }

            let mut chunks = response.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.map_err(network_error)?;
                on_chunk(&chunk);
            }

            Ok::<(), ExchangeError>(())
        };

        match tokio::time::timeout(exchange.timeout, pump).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Stream {} timed out after {} ms",
                    exchange.path,
                    exchange.timeout_ms()
                );
                Err(ExchangeError::Timeout {
                    timeout_ms: exchange.timeout_ms(),
                })
            }
        }
    }

    async fn round_trip(
        &self,
        exchange: &Exchange,
        endpoint: &Endpoint,
    ) -> Result<Value, ExchangeError> {
        let response = self
            .build_request(exchange, endpoint)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        classify_response(status, &body)
    }

    fn build_request(&self, exchange: &Exchange, endpoint: &Endpoint) -> reqwest::RequestBuilder {
        let request = self
            .http
            .request(exchange.method.into(), endpoint.url_for(&exchange.path))
            .header(ACCEPT, exchange.accept.header_value());

        match &exchange.body {
            Some(body) => {
                let bytes = body.to_string().into_bytes();
                request
                    .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .header(CONTENT_LENGTH, bytes.len())
                    .body(bytes)
            }
            None => request,
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a status code and raw body into a decoded value or a typed failure.
pub fn classify_response(status: u16, body: &str) -> Result<Value, ExchangeError> {
    if status >= 400 {
        return Err(remote_error(status, body));
    }

    serde_json::from_str(body).map_err(|e| {
        debug!("Response body is not JSON: {}", e);
        ExchangeError::InvalidResponse(truncate_chars(body, INVALID_BODY_PREVIEW_CHARS))
    })
}

/// Build a remote error, preferring the server's `detail` string.
pub(crate) fn remote_error(status: u16, body: &str) -> ExchangeError {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("detail")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });

    let message = detail.unwrap_or_else(|| truncate_chars(body, REMOTE_BODY_PREVIEW_CHARS));
    warn!("Brain returned {}: {}", status, message);

    ExchangeError::Remote { status, message }
}

fn network_error(err: reqwest::Error) -> ExchangeError {
    debug!("Transport failure: {}", err);
    ExchangeError::Network(err.to_string())
}

/// First `max` characters of `s`, never splitting a character.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_success_decodes_json() {
        let value = classify_response(200, r#"{"status":"ok"}"#).unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[test]
    fn classify_remote_error_uses_detail() {
        let err = classify_response(404, r#"{"detail":"not found"}"#).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Remote {
                status: 404,
                message: "not found".to_string()
            }
        );
    }

    #[test]
    fn classify_remote_error_without_detail_truncates_body() {
        let test_cases = vec![
            ("plain text", "x".repeat(450), 300),
            ("short plain text", "Internal Server Error".to_string(), 21),
            ("json without detail", format!(r#"{{"error":"{}"}}"#, "e".repeat(400)), 300),
            ("detail is not a string", r#"{"detail":[{"loc":["body"]}]}"#.to_string(), 29),
        ];

        for (description, body, expected_len) in test_cases {
            let err = classify_response(500, &body).unwrap_err();
            let message = err.remote_message().expect(description).to_string();
            assert_eq!(message.chars().count(), expected_len, "{}", description);
            assert!(body.starts_with(&message), "{}", description);
        }
    }

    #[test]
    fn classify_non_json_success_is_invalid_response() {
        let body = "<html>".to_string() + &"y".repeat(300);
        let err = classify_response(200, &body).unwrap_err();
        match err {
            ExchangeError::InvalidResponse(preview) => {
                assert_eq!(preview.chars().count(), 200);
                assert!(preview.starts_with("<html>"));
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn classify_empty_success_body_is_invalid_response() {
        assert_eq!(
            classify_response(204, ""),
            Err(ExchangeError::InvalidResponse(String::new()))
        );
    }

    #[test]
    fn truncate_respects_character_boundaries() {
        let body = "é".repeat(350);
        let truncated = truncate_chars(&body, 300);
        assert_eq!(truncated.chars().count(), 300);
        assert_eq!(truncated.len(), 600);
    }

    #[test]
    fn exchange_builders() {
        let exchange = Exchange::new(Method::Post, "/models/pull", None, Duration::from_secs(600))
            .event_stream()
            .tracked();
        assert_eq!(exchange.accept, Accept::EventStream);
        assert!(exchange.tracked);
        assert_eq!(exchange.timeout_ms(), 600_000);
        assert_eq!(Method::Get.to_string(), "GET");
    }
}

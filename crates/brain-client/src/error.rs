/// Failure of a single exchange with the Brain.
///
/// Health probes never surface these; see
/// [`probe_succeeded`](crate::connectivity::probe_succeeded).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// Connection refused, DNS failure, reset, or a canceled tracked exchange.
    #[error("Network error: {0}")]
    Network(String),
    /// No complete response within the exchange timeout. The connection was dropped.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// HTTP status >= 400. `message` is the `detail` field or the truncated raw body.
    #[error("Brain returned {status}: {message}")]
    Remote { status: u16, message: String },
    /// HTTP status < 400 but the body is not the expected JSON.
    #[error("Invalid response from Brain: {0}")]
    InvalidResponse(String),
}

impl ExchangeError {
    /// Message carried by a remote error, if this is one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ExchangeError::Remote { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns a user-friendly error message suitable for display in the host
    pub fn user_message(&self) -> String {
        match self {
            ExchangeError::Network(msg) if msg == CANCELED_MESSAGE => {
                "Request canceled.".to_string()
            }
            ExchangeError::Network(_) => {
                "Cannot reach the Brain. Is the local service running?".to_string()
            }
            ExchangeError::Timeout { timeout_ms } => format!(
                "The Brain did not answer within {} seconds. Try again.",
                timeout_ms / 1000
            ),
            ExchangeError::Remote { status, message } => {
                if *status == 429 {
                    "Rate limit reached. Please wait and retry.".to_string()
                } else {
                    format!("Brain error: {}", message)
                }
            }
            ExchangeError::InvalidResponse(_) => {
                "The Brain sent a response that could not be read.".to_string()
            }
        }
    }
}

/// Network message used when a tracked exchange is canceled locally.
pub(crate) const CANCELED_MESSAGE: &str = "request canceled";

use aether_brain_client::{EndpointError, ExchangeError};
use derive_more::{Display, From};

use crate::config::ConfigError;

#[derive(Debug, From, Display)]
pub enum Error {
    #[from]
    #[display("{_0}")]
    Exchange(ExchangeError),

    #[from]
    #[display("{_0}")]
    Endpoint(EndpointError),

    #[from]
    #[display("{_0}")]
    Config(ConfigError),

    #[from]
    #[display("{_0}")]
    Io(std::io::Error),

    #[from]
    #[display("Failed to encode output: {_0}")]
    Json(serde_json::Error),

    #[display("Brain is not reachable at {_0}")]
    BrainOffline(String),

    #[display("Pull of '{model}' failed: {message}")]
    PullFailed { model: String, message: String },

    #[display("{_0}")]
    InvalidInput(String),
}

impl Error {
    /// Message shown to the user on exit
    pub fn user_message(&self) -> String {
        match self {
            Error::Exchange(e) => e.user_message(),
            Error::BrainOffline(endpoint) => format!(
                "Cannot reach the Brain at {} (or on the next 9 ports). Is the local service running?",
                endpoint
            ),
            other => other.to_string(),
        }
    }
}

//! Loopback HTTP client for the Brain prompt-generation service.
//!
//! # Layers
//!
//! - [`Transport`]: one request/response exchange with a timeout
//! - [`RequestDispatcher`]: fire-and-forget exchanges plus a single
//!   cancelable (tracked) exchange
//! - [`ConnectivityMonitor`]: health probe and port rediscovery, driven on a
//!   cadence by [`ConnectivityPoller`]
//! - [`StreamIngester`]: progress events from the model pull stream
//! - [`BrainClient`]: the typed operations built on the above
//!
//! # Example
//!
//! ```no_run
//! use aether_brain_client::{BrainClient, Endpoint, VibeRequest};
//!
//! # async fn run() -> Result<(), aether_brain_client::ExchangeError> {
//! let client = BrainClient::new(Endpoint::default());
//! if client.health_check().await {
//!     let response = client.generate(&VibeRequest::new("a todo app")).await?;
//!     println!("{}", response.prompt);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod connectivity;
mod dispatcher;
mod endpoint;
mod error;
pub mod stream;
mod transport;

pub use api::{BrainClient, VibeRequest};
pub use connectivity::{
    probe_succeeded, Connectivity, ConnectivityMonitor, ConnectivityPoller, ConnectivityState,
    HealthProbe,
};
pub use dispatcher::{RequestDispatcher, TRACKED_TIMEOUT};
pub use endpoint::{Endpoint, EndpointError, DEFAULT_ENDPOINT, DEFAULT_PORT};
pub use error::ExchangeError;
pub use stream::{ProgressEvent, PullOutcome, PullStatus, StreamIngester};
pub use transport::{classify_response, Accept, Exchange, Method, Transport};

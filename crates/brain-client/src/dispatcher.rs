//! Request dispatch over [`Transport`].
//!
//! Two calling modes share one transport:
//! - fire-and-forget: independent, uncancelable, any number in flight
//! - tracked: the handle of the most recently started exchange sits in a
//!   single slot and can be canceled through [`RequestDispatcher::cancel`]

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::endpoint::Endpoint;
use crate::error::{ExchangeError, CANCELED_MESSAGE};
use crate::transport::{Exchange, Method, Transport};

/// Timeout of the tracked (generation) exchange.
pub const TRACKED_TIMEOUT: Duration = Duration::from_secs(300);

/// In-flight handle of a tracked exchange.
#[derive(Debug, Clone)]
struct TrackedHandle {
    id: Uuid,
    cancel: CancellationToken,
}

/// Clears the tracked slot when a tracked exchange ends, but only if the slot
/// still holds this exchange's handle. Runs on drop so an abandoned call
/// cleans up too.
struct SlotRelease<'a> {
    slot: &'a Mutex<Option<TrackedHandle>>,
    id: Uuid,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|h| h.id) == Some(self.id) {
            *slot = None;
        }
    }
}

/// Owns the endpoint and the tracked slot; hands exchanges to the transport.
#[derive(Debug)]
pub struct RequestDispatcher {
    transport: Transport,
    endpoint: Mutex<Endpoint>,
    tracked: Mutex<Option<TrackedHandle>>,
    tracked_timeout: Duration,
}

impl RequestDispatcher {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_transport(Transport::new(), endpoint)
    }

    pub fn with_transport(transport: Transport, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint: Mutex::new(endpoint),
            tracked: Mutex::new(None),
            tracked_timeout: TRACKED_TIMEOUT,
        }
    }

    /// Override the tracked exchange timeout (default [`TRACKED_TIMEOUT`]).
    pub fn with_tracked_timeout(mut self, timeout: Duration) -> Self {
        self.tracked_timeout = timeout;
        self
    }

    /// Snapshot of the current endpoint.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.lock().unwrap().clone()
    }

    /// Replace the endpoint. Exchanges already under way keep their snapshot.
    pub fn set_endpoint(&self, endpoint: Endpoint) {
        let mut current = self.endpoint.lock().unwrap();
        if *current != endpoint {
            info!("Brain endpoint changed: {} -> {}", current, endpoint);
            *current = endpoint;
        }
    }

    /// Independent exchange. Never touches the tracked slot.
    pub async fn fire_and_forget(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
        endpoint_override: Option<&Endpoint>,
    ) -> Result<Value, ExchangeError> {
        let endpoint = match endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => self.endpoint(),
        };
        let exchange = Exchange::new(method, path, body, timeout);
        self.transport.execute(&exchange, &endpoint).await
    }

    /// Independent event-stream exchange; `on_chunk` sees raw body bytes.
    pub async fn fire_and_forget_stream<F>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
        on_chunk: F,
    ) -> Result<(), ExchangeError>
    where
        F: FnMut(&[u8]),
    {
        let endpoint = self.endpoint();
        let exchange = Exchange::new(method, path, body, timeout).event_stream();
        self.transport.stream(&exchange, &endpoint, on_chunk).await
    }

    /// Cancelable exchange. Overwrites the tracked slot without canceling
    /// whatever it held before; that older exchange runs to its own end.
    pub async fn tracked(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ExchangeError> {
        let handle = TrackedHandle {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };
        let id = handle.id;
        let cancel = handle.cancel.clone();

        {
            let mut slot = self.tracked.lock().unwrap();
            if let Some(previous) = slot.replace(handle) {
                debug!(
                    "Tracked exchange {} superseded by {}; it can no longer be canceled",
                    previous.id, id
                );
            }
        }
        let _release = SlotRelease {
            slot: &self.tracked,
            id,
        };

        let endpoint = self.endpoint();
        let exchange = Exchange::new(method, path, body, self.tracked_timeout).tracked();

        tokio::select! {
            result = self.transport.execute(&exchange, &endpoint) => result,
            () = cancel.cancelled() => {
                info!("Tracked exchange {} {} canceled", method, path);
                Err(ExchangeError::Network(CANCELED_MESSAGE.to_string()))
            }
        }
    }

    /// Abort the connection of the tracked exchange, if any, and clear the
    /// slot. Returns whether something was canceled. The Brain is not told;
    /// work it already started keeps running there.
    pub fn cancel(&self) -> bool {
        let handle = self.tracked.lock().unwrap().take();
        match handle {
            Some(handle) => {
                debug!("Canceling tracked exchange {}", handle.id);
                handle.cancel.cancel();
                true
            }
            None => {
                debug!("Cancel requested with no tracked exchange in flight");
                false
            }
        }
    }

    /// Whether the tracked slot currently holds a handle.
    pub fn is_tracked_in_flight(&self) -> bool {
        self.tracked.lock().unwrap().is_some()
    }
}

//! Brain reachability: health probe, port rediscovery and online/offline
//! hysteresis.

mod monitor;
mod poller;
mod tracker;

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::api::HealthResponse;
use crate::error::ExchangeError;

pub use monitor::{ConnectivityMonitor, EndpointListener, HealthProbe, DISCOVERY_SPAN};
pub use poller::{ConnectivityPoller, DEFAULT_POLL_INTERVAL};
pub use tracker::{
    Connectivity, ConnectivityState, ConnectivityTracker, Transition, OFFLINE_THRESHOLD,
};

pub const HEALTH_PATH: &str = "/health";
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Collapse a health exchange into a yes/no. Every error kind is a failed
/// probe, as is any body that is not a health response with `status: "ok"`.
pub fn probe_succeeded(result: &Result<Value, ExchangeError>) -> bool {
    match result {
        Ok(body) => HealthResponse::deserialize(body).is_ok_and(|health| health.is_ok()),
        Err(_) => false,
    }
}

//! Online/offline hysteresis.
//!
//! ```text
//! Offline ──1 success──> Online ──3 consecutive failures──> Offline
//! ```
//!
//! A single failed probe while Online does not flip the state; a slow or
//! restarting Brain gets two more ticks before the host shows it as gone.

use serde::Serialize;

/// Consecutive failures while Online that flip the state to Offline.
pub const OFFLINE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

/// Snapshot published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityState {
    pub online: bool,
    pub consecutive_failures: u32,
}

impl ConnectivityState {
    pub fn connectivity(&self) -> Connectivity {
        if self.online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }
}

/// Result of feeding one probe result into the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed { from: Connectivity, to: Connectivity },
    Unchanged,
}

/// Pure state machine over [`ConnectivityState`]. Starts Offline.
#[derive(Debug, Default)]
pub struct ConnectivityTracker {
    state: ConnectivityState,
}

impl ConnectivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Record one health check result.
    pub fn observe(&mut self, healthy: bool) -> Transition {
        let from = self.state.connectivity();

        if healthy {
            self.state.consecutive_failures = 0;
            self.state.online = true;
        } else {
            self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
            if self.state.online && self.state.consecutive_failures >= OFFLINE_THRESHOLD {
                self.state.online = false;
            }
        }

        let to = self.state.connectivity();
        if from == to {
            Transition::Unchanged
        } else {
            Transition::Changed { from, to }
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::monitor::ConnectivityMonitor;
use super::tracker::{Connectivity, ConnectivityState, ConnectivityTracker, Transition};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Drives [`ConnectivityMonitor::health_check`] on a fixed cadence and
/// publishes the hysteresis state.
pub struct ConnectivityPoller {
    monitor: Arc<ConnectivityMonitor>,
    interval: Duration,
    state_tx: watch::Sender<ConnectivityState>,
    cancel: CancellationToken,
}

impl ConnectivityPoller {
    pub fn new(monitor: Arc<ConnectivityMonitor>, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(ConnectivityState::default());
        Self {
            monitor,
            interval,
            state_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Receiver that sees every published state, starting from Offline.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state_tx.subscribe()
    }

    /// Token that stops the loop when canceled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Check immediately, then once per interval, until canceled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tracker = ConnectivityTracker::new();

        info!("Connectivity polling started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let healthy = tokio::select! {
                _ = self.cancel.cancelled() => break,
                healthy = self.monitor.health_check() => healthy,
            };

            match tracker.observe(healthy) {
                Transition::Changed { from, to } => match to {
                    Connectivity::Online => {
                        info!("Brain {} -> {} at {}", from, to, self.monitor.dispatcher().endpoint())
                    }
                    Connectivity::Offline => warn!(
                        "Brain {} -> {} after {} failed checks",
                        from,
                        to,
                        tracker.state().consecutive_failures
                    ),
                },
                Transition::Unchanged => {
                    debug!("Health check: {} ({:?})", healthy, tracker.state())
                }
            }

            self.state_tx.send_replace(tracker.state());
        }

        info!("Connectivity polling stopped");
    }
}

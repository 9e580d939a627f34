use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use super::{probe_succeeded, HEALTH_PATH, HEALTH_TIMEOUT};
use crate::dispatcher::RequestDispatcher;
use crate::endpoint::Endpoint;
use crate::transport::Method;

/// Number of ports above the configured one tried during discovery.
pub const DISCOVERY_SPAN: u16 = 9;

/// Callback invoked with the endpoint adopted by discovery.
pub type EndpointListener = Box<dyn Fn(&Endpoint) + Send + Sync>;

/// One health probe against a specific endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint) -> bool;
}

#[async_trait]
impl HealthProbe for RequestDispatcher {
    async fn probe(&self, endpoint: &Endpoint) -> bool {
        let result = self
            .fire_and_forget(Method::Get, HEALTH_PATH, None, HEALTH_TIMEOUT, Some(endpoint))
            .await;
        probe_succeeded(&result)
    }
}

/// Health checking and endpoint rediscovery.
///
/// Holds no online/offline state; that belongs to the scheduler driving
/// [`health_check`](Self::health_check).
pub struct ConnectivityMonitor {
    dispatcher: Arc<RequestDispatcher>,
    probe: Arc<dyn HealthProbe>,
    listener: Option<EndpointListener>,
}

impl ConnectivityMonitor {
    /// Monitor probing through the dispatcher itself.
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        let probe: Arc<dyn HealthProbe> = dispatcher.clone();
        Self::with_probe(dispatcher, probe)
    }

    pub fn with_probe(dispatcher: Arc<RequestDispatcher>, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            dispatcher,
            probe,
            listener: None,
        }
    }

    /// Register a callback for endpoints adopted by discovery.
    pub fn on_endpoint_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Endpoint) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    /// Probe the configured endpoint; on failure, try to rediscover the Brain
    /// on a nearby port. Never fails, only reports `false`.
    pub async fn health_check(&self) -> bool {
        let configured = self.dispatcher.endpoint();
        if self.probe.probe(&configured).await {
            return true;
        }

        debug!("Health probe failed at {}; starting discovery", configured);
        match self.discover(&configured).await {
            Some(found) => {
                self.dispatcher.set_endpoint(found.clone());
                if let Some(listener) = &self.listener {
                    listener(&found);
                }
                true
            }
            None => false,
        }
    }

    /// Probe `port+1 ..= port+9` in ascending order and return the first
    /// endpoint that answers. Ports past 65535 are skipped.
    pub async fn discover(&self, base: &Endpoint) -> Option<Endpoint> {
        let port = base.discovery_base_port();

        for offset in 1..=DISCOVERY_SPAN {
            let Some(candidate_port) = port.checked_add(offset) else {
                break;
            };
            let candidate = base.with_port(candidate_port);
            if self.probe.probe(&candidate).await {
                info!("Discovered Brain at {}", candidate);
                return Some(candidate);
            }
        }

        debug!(
            "No Brain found on ports {}..={}",
            port.saturating_add(1),
            port.saturating_add(DISCOVERY_SPAN)
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers ok only on the listed ports and records every probe.
    struct FakeProbe {
        healthy_ports: Vec<u16>,
        probed: Mutex<Vec<u16>>,
    }

    impl FakeProbe {
        fn new(healthy_ports: &[u16]) -> Arc<Self> {
            Arc::new(Self {
                healthy_ports: healthy_ports.to_vec(),
                probed: Mutex::new(Vec::new()),
            })
        }

        fn probed(&self) -> Vec<u16> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for FakeProbe {
        async fn probe(&self, endpoint: &Endpoint) -> bool {
            self.probed.lock().unwrap().push(endpoint.port());
            self.healthy_ports.contains(&endpoint.port())
        }
    }

    fn monitor_at(endpoint: Endpoint, probe: Arc<FakeProbe>) -> ConnectivityMonitor {
        let dispatcher = Arc::new(RequestDispatcher::new(endpoint));
        ConnectivityMonitor::with_probe(dispatcher, probe)
    }

    #[tokio::test]
    async fn healthy_configured_endpoint_skips_discovery() {
        let probe = FakeProbe::new(&[8420]);
        let monitor = monitor_at(Endpoint::default(), probe.clone());

        assert!(monitor.health_check().await);
        assert_eq!(probe.probed(), vec![8420]);
    }

    #[tokio::test]
    async fn discovery_stops_at_first_healthy_port() {
        let probe = FakeProbe::new(&[8423, 8425]);
        let adopted = Arc::new(AtomicUsize::new(0));
        let adopted_port = adopted.clone();
        let monitor = monitor_at(Endpoint::default(), probe.clone()).on_endpoint_change(
            move |endpoint| adopted_port.store(endpoint.port() as usize, Ordering::SeqCst),
        );

        assert!(monitor.health_check().await);
        assert_eq!(probe.probed(), vec![8420, 8421, 8422, 8423]);
        assert_eq!(monitor.dispatcher().endpoint().port(), 8423);
        assert_eq!(adopted.load(Ordering::SeqCst), 8423);
    }

    #[tokio::test]
    async fn discovery_exhausts_span_then_reports_offline() {
        let probe = FakeProbe::new(&[8430]);
        let monitor = monitor_at(Endpoint::default(), probe.clone());

        assert!(!monitor.health_check().await);
        assert_eq!(probe.probed(), (8420..=8429).collect::<Vec<u16>>());
        assert_eq!(monitor.dispatcher().endpoint(), Endpoint::default());
    }

    #[tokio::test]
    async fn discovery_keeps_scheme_and_host() {
        let probe = FakeProbe::new(&[9001]);
        let base = Endpoint::parse("http://localhost:9000").unwrap();
        let monitor = monitor_at(base, probe);

        assert!(monitor.health_check().await);
        assert_eq!(monitor.dispatcher().endpoint().to_string(), "http://localhost:9001");
    }

    #[tokio::test]
    async fn scheme_default_port_is_tried_then_scan_starts_at_brain_port() {
        let probe = FakeProbe::new(&[8422]);
        let monitor = monitor_at(Endpoint::parse("http://localhost").unwrap(), probe.clone());

        assert!(monitor.health_check().await);
        assert_eq!(probe.probed(), vec![80, 8421, 8422]);
        assert_eq!(monitor.dispatcher().endpoint().to_string(), "http://localhost:8422");
    }

    #[tokio::test]
    async fn discovery_never_probes_past_max_port() {
        let probe = FakeProbe::new(&[]);
        let monitor = monitor_at(Endpoint::loopback(65533), probe.clone());

        assert!(monitor.discover(&Endpoint::loopback(65533)).await.is_none());
        assert_eq!(probe.probed(), vec![65534, 65535]);
    }
}

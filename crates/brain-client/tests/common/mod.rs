#![allow(dead_code)]

use std::net::SocketAddr;

use aether_brain_client::Endpoint;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// In-process stand-in for the Brain, bound to an ephemeral loopback port.
pub struct StubBrain {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubBrain {
    pub async fn spawn(app: axum::Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::loopback(self.addr.port())
    }
}

impl Drop for StubBrain {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Endpoint on a loopback port nothing listens on.
pub async fn dead_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Endpoint::loopback(port)
}

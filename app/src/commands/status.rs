use std::time::Duration;

use aether_brain_client::{BrainClient, ConnectivityPoller};
use log::info;
use serde_json::json;

use super::print_json;
use crate::error::Error;

pub async fn health(client: &BrainClient) -> Result<(), Error> {
    let online = client.health_check().await;
    let endpoint = client.endpoint();

    print_json(&json!({
        "online": online,
        "endpoint": endpoint.to_string(),
    }))?;

    if online {
        Ok(())
    } else {
        Err(Error::BrainOffline(endpoint.to_string()))
    }
}

/// Print one JSON line per published connectivity state until Ctrl-C.
pub async fn watch(client: &BrainClient, interval_secs: u64) -> Result<(), Error> {
    let interval = Duration::from_secs(interval_secs.max(1));
    let poller = ConnectivityPoller::new(client.monitor().clone(), interval);
    let mut states = poller.subscribe();
    let cancel = poller.cancellation_token();
    let handle = poller.spawn();

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!(
                    "{}",
                    json!({
                        "connectivity": state.connectivity(),
                        "consecutiveFailures": state.consecutive_failures,
                        "endpoint": client.endpoint().to_string(),
                    })
                );
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupted; stopping watch");
                break;
            }
        }
    }

    cancel.cancel();
    if let Err(e) = handle.await {
        log::error!("Connectivity poller ended abnormally: {}", e);
    }
    Ok(())
}

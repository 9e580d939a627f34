mod cli;
mod commands;
pub mod config;
mod error;
mod logging;

use std::sync::Arc;

use aether_brain_client::{BrainClient, ConnectivityMonitor, RequestDispatcher};
use log::{debug, warn};

pub use cli::{CliArgs, Command};
pub use error::Error;
pub use logging::init as init_logging;

use config::{ConfigKey, ConfigStore, FileConfigStore};

/// Wire the Brain client to persisted configuration and run one subcommand.
pub async fn run(args: CliArgs) -> Result<(), Error> {
    let store = Arc::new(match &args.config {
        Some(path) => FileConfigStore::open(path.clone()),
        None => FileConfigStore::open_default()?,
    });
    debug!("Using config at {}", store.path().display());

    let brain_config = store.get(&ConfigKey::BRAIN).unwrap_or_default();
    let endpoint = config::resolve_endpoint(args.brain_url.as_deref(), &brain_config)?;
    debug!("Brain endpoint: {}", endpoint);

    let dispatcher = Arc::new(RequestDispatcher::new(endpoint));
    let persist = store.clone();
    let monitor = ConnectivityMonitor::new(dispatcher).on_endpoint_change(move |endpoint| {
        if let Err(e) = config::remember_endpoint(persist.as_ref(), endpoint) {
            warn!("Failed to persist discovered endpoint: {}", e);
        }
    });
    let client = BrainClient::with_monitor(Arc::new(monitor));

    commands::execute(args.command, &client, &brain_config).await
}

mod generation;
mod models;
mod status;

use aether_brain_client::BrainClient;
use serde::Serialize;

use crate::cli::Command;
use crate::config::BrainConfig;
use crate::error::Error;

pub use generation::{generate, optimize, score};
pub use models::{agents, catalog, knowledge, list_models, pull, select};
pub use status::{health, watch};

/// Run one subcommand to completion.
pub async fn execute(command: Command, client: &BrainClient, config: &BrainConfig) -> Result<(), Error> {
    match command {
        Command::Health => health(client).await,
        Command::Watch { interval } => {
            watch(client, interval.unwrap_or(config.poll_interval_secs)).await
        }
        Command::Generate {
            vibe,
            agent,
            workspace,
        } => generate(client, &vibe, &agent, workspace).await,
        Command::Agents => agents(client).await,
        Command::Models => list_models(client).await,
        Command::Select { model } => select(client, &model).await,
        Command::Catalog => catalog(client).await,
        Command::Pull { model } => pull(client, &model).await,
        Command::Score { prompt } => score(client, &prompt).await,
        Command::Optimize {
            vibe,
            family,
            tech_stack,
            language,
        } => optimize(client, &vibe, family, tech_stack, language).await,
        Command::Knowledge { category } => knowledge(client, category.as_deref()).await,
    }
}

/// Pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

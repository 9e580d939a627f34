use std::path::PathBuf;

use aether_brain_client::api::OptimizeRequest;
use aether_brain_client::{BrainClient, VibeRequest};
use log::{info, warn};

use super::print_json;
use crate::cli::read_value_or_file;
use crate::error::Error;

/// Generate a prompt. The Brain is health-checked first so a dead service
/// fails fast instead of waiting out the generation timeout.
pub async fn generate(
    client: &BrainClient,
    vibe: &str,
    agent: &str,
    workspace: Option<PathBuf>,
) -> Result<(), Error> {
    let vibe = read_value_or_file(vibe).map_err(Error::InvalidInput)?;
    if vibe.trim().is_empty() {
        return Err(Error::InvalidInput("Vibe must not be empty".to_string()));
    }

    let workspace = match workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    if !client.health_check().await {
        return Err(Error::BrainOffline(client.endpoint().to_string()));
    }

    let request = VibeRequest::new(vibe)
        .with_agent(agent)
        .with_workspace(workspace.to_string_lossy());

    let generation = client.generate(&request);
    tokio::pin!(generation);

    let result = tokio::select! {
        result = &mut generation => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            if client.cancel_generation() {
                info!("Generation canceled");
            }
            generation.await
        }
    };

    let response = result?;
    if response.security_verdict != "PASS" {
        warn!("Security verdict: {}", response.security_verdict);
    }
    print_json(&response)
}

pub async fn score(client: &BrainClient, prompt: &str) -> Result<(), Error> {
    let prompt = read_value_or_file(prompt).map_err(Error::InvalidInput)?;
    let response = client.score_prompt(&prompt).await?;
    print_json(&response)
}

pub async fn optimize(
    client: &BrainClient,
    vibe: &str,
    family: String,
    tech_stack: String,
    language: String,
) -> Result<(), Error> {
    let vibe = read_value_or_file(vibe).map_err(Error::InvalidInput)?;
    let request = OptimizeRequest {
        vibe,
        family,
        tech_stack,
        language,
    };
    let response = client.optimize_prompt(&request).await?;
    print_json(&response)
}

use std::io::Write;

use aether_brain_client::{BrainClient, ProgressEvent};

use super::print_json;
use crate::error::Error;

pub async fn agents(client: &BrainClient) -> Result<(), Error> {
    print_json(&client.list_agents().await?)
}

pub async fn list_models(client: &BrainClient) -> Result<(), Error> {
    print_json(&client.list_models().await?)
}

pub async fn select(client: &BrainClient, model: &str) -> Result<(), Error> {
    print_json(&client.select_model(model).await?)
}

pub async fn catalog(client: &BrainClient) -> Result<(), Error> {
    print_json(&client.catalog().await?)
}

/// Whole knowledge base, or one category's patterns when given.
pub async fn knowledge(client: &BrainClient, category: Option<&str>) -> Result<(), Error> {
    match category {
        Some(category) => print_json(&client.knowledge_category(category).await?),
        None => print_json(&client.knowledge_base().await?),
    }
}

/// Download a model. Progress goes to stderr, the outcome to stdout.
pub async fn pull(client: &BrainClient, model: &str) -> Result<(), Error> {
    let mut stderr = std::io::stderr();
    let outcome = client
        .pull_model(model, |event: ProgressEvent| {
            let _ = write!(stderr, "\r{:>5.1}%  {:<40}", event.pct, event.status);
            let _ = stderr.flush();
        })
        .await;
    eprintln!();

    let outcome = outcome?;
    print_json(&outcome)?;

    if outcome.is_ok() {
        Ok(())
    } else {
        Err(Error::PullFailed {
            model: model.to_string(),
            message: outcome.message.unwrap_or_default(),
        })
    }
}

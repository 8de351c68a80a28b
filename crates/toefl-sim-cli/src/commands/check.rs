//! The `toefl-sim check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use toefl_sim_providers::config::load_config_from;
use toefl_sim_providers::create_client;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(?config, "loaded config");
    let client = create_client(&config)?;

    println!("Provider: {}", client.provider_name());
    println!("Model:    {}", client.model());

    let known = client.available_models();
    if !known.iter().any(|m| m.id == client.model()) {
        let ids: Vec<&str> = known.iter().map(|m| m.id.as_str()).collect();
        println!("Note: {} is not a known model ({})", client.model(), ids.join(", "));
    }

    client
        .check()
        .await
        .with_context(|| format!("{} did not answer a test request", client.model()))?;

    println!("OK: the model is reachable.");
    Ok(())
}

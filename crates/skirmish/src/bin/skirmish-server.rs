//! Runs a Skirmish match server.
//!
//! - `SKIRMISH_BIND`: listen address, default `0.0.0.0:8080`
//! - `SKIRMISH_MATCH_CONFIG`: optional path to a JSON `MatchConfig`
//! - `RUST_LOG`: log filter, default `info`

use skirmish::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind = std::env::var("SKIRMISH_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let match_config = match std::env::var("SKIRMISH_MATCH_CONFIG") {
        Ok(path) => load_match_config(&path)?,
        Err(_) => MatchConfig::default(),
    };

    let server = SkirmishServer::builder()
        .bind(&bind)
        .match_config(match_config)
        .build()
        .await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }
    server.run().await
}

fn load_match_config(path: &str) -> Result<MatchConfig, SkirmishError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SkirmishError::Config(format!("cannot read {path}: {e}")))?;
    serde_json::from_str(&text).map_err(|e| SkirmishError::Config(format!("{path}: {e}")))
}

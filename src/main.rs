use audit_verifier::{api::Server, backend::SnapshotLedger, config::Config};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Path used when `AUDIT_VERIFIER_CONFIG` is not set
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The main entry point for the verifier service.
///
/// Initializes logging, loads the configuration, opens the ledger and
/// serves the JSON-RPC API until the process is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path =
        std::env::var("AUDIT_VERIFIER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Verifier starting with config: {:?}", config);

    let ledger = match &config.ledger.snapshot_path {
        Some(path) => SnapshotLedger::load(&config.ledger.organization_id, &config.ledger.network, path)?,
        None => {
            warn!("No ledger snapshot configured, serving an empty ledger");
            SnapshotLedger::new(&config.ledger.organization_id, &config.ledger.network)
        }
    };

    let server = Server::new(config, Arc::new(ledger));
    server.start().await?;

    Ok(())
}

//! Connects to one hub and logs what happens.
//!
//! Usage: `hublink-monitor [CONFIG]`. The configuration path falls back to
//! `$HUBLINK_CONFIG`. Stop with Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use hublink_connection::{
    ConnectionState, DeviceRegistry, HubConfig, HubConnection, InMemoryRegistry, LogNotifier,
    TungsteniteConnector,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config_path().context("no configuration given (argument or HUBLINK_CONFIG)")?;
    let config = HubConfig::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let endpoint = config.endpoint().context("invalid hub configuration")?;
    let owner = endpoint.owner_id.clone();

    let registry = Arc::new(InMemoryRegistry::new());
    let conn = HubConnection::spawn(
        endpoint,
        config.timings(),
        registry.clone(),
        Arc::new(LogNotifier),
        Arc::new(TungsteniteConnector::new()),
    );

    let mut states = conn.subscribe();
    conn.connect();

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!("state: {state:?}");
                if state == ConnectionState::Connected {
                    for device in registry.list_by_owner(&owner) {
                        println!("  {} [{}] {}", device.id, device.category, device.friendly_name);
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::info!("shutting down");
                conn.shutdown();
                conn.stopped().await;
                break;
            }
        }
    }

    Ok(())
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("HUBLINK_CONFIG"))
        .map(PathBuf::from)
}

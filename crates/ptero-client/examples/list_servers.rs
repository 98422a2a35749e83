//! List the first page of servers on a panel.
//!
//! ```text
//! RUST_LOG=debug cargo run -p ptero_client --example list_servers -- ptero.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use ptero_client::{ClientConfig, QueryOptions, RequestDispatcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ptero.json".to_string())
        .into();
    let config = ClientConfig::read(&path)
        .await
        .with_context(|| format!("loading {}", path.display()))?;

    let mut dispatcher = RequestDispatcher::from_config(config);
    dispatcher.on_debug(|message| {
        tracing::debug!("{}", message);
        Ok(())
    });
    dispatcher.on_receive(|payload| {
        let count = payload
            .get("data")
            .and_then(|d| d.as_array())
            .map_or(0, Vec::len);
        tracing::info!(count, "Received servers");
        Ok(())
    });

    let query = QueryOptions::new().per_page(10).include(["allocations"]);
    let servers = dispatcher
        .get("/servers", query)
        .await
        .context("listing servers")?;

    if let Some(body) = servers {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    tracing::info!(
        latency_secs = dispatcher.last_latency_seconds(),
        "Request finished"
    );

    Ok(())
}

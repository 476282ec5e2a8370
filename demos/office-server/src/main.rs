//! Virtual office presence server.
//!
//! Serves the MetaHive protocol on `METAHIVE_BIND` (default `0.0.0.0:8080`).
//! Log verbosity follows `RUST_LOG`, e.g. `RUST_LOG=metahive=debug`.

use std::time::Duration;

use metahive::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Picks the listen address from an optional override.
fn bind_addr(var: Option<String>) -> String {
    var.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

fn idle_timeout(var: Option<String>) -> Duration {
    var.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(metahive::DEFAULT_IDLE_TIMEOUT, Duration::from_secs)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = bind_addr(std::env::var("METAHIVE_BIND").ok());
    let idle = idle_timeout(std::env::var("METAHIVE_IDLE_SECS").ok());
    tracing::info!(%addr, idle_secs = idle.as_secs(), "starting office server");

    let server = MetahiveServer::builder()
        .bind(&addr)
        .idle_timeout(idle)
        .build()
        .await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

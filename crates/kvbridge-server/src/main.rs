//! kvbridge server
//!
//! Serves an in-memory ordered KV store over the bridge HTTP protocol.

use anyhow::Result;
use clap::Parser;
use kvbridge_server::config::{DEFAULT_PAGE_SIZE, DEFAULT_PORT};
use kvbridge_server::{BridgeServer, ServerConfig};
use kvbridge_store::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn};

/// How often expired entries are reclaimed
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "kvbridge")]
#[command(about = "HTTP bridge to an ordered key-value store")]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Entries per browse page when the request gives no limit
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting kvbridge on {}", args.bind);
    info!("Default page size: {}", args.page_size);

    let store = MemoryStore::new();
    let config = ServerConfig::new().bind(args.bind).page_size(args.page_size);

    let sweeper = {
        let store = store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired();
                if removed > 0 {
                    debug!(removed, remaining = store.len(), "Expired entries reclaimed");
                }
            }
        })
    };

    let server = BridgeServer::new(Arc::new(store), config);
    server
        .run(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
            }
        })
        .await?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

//! Server lifecycle

use crate::app::create_bridge_app;
use crate::config::ServerConfig;
use kvbridge_store::KvStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Bridge HTTP server over a storage engine
pub struct BridgeServer {
    store: Arc<dyn KvStore>,
    config: ServerConfig,
}

/// Handle for a server running in the background
///
/// Dropping the handle shuts the server down.
pub struct ServerHandle {
    /// Base URL, e.g. `http://127.0.0.1:47168`
    pub url: String,
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServerHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl BridgeServer {
    pub fn new(store: Arc<dyn KvStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind).await?;
        info!("Bridge server listening on http://{}", listener.local_addr()?);

        let app = create_bridge_app(self.store, &self.config);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Bridge server stopped");
        Ok(())
    }

    /// Bind and serve on a background task
    ///
    /// Binding to port 0 picks a free port; the handle reports the actual
    /// address.
    pub async fn spawn(self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind(self.config.bind).await?;
        let addr = listener.local_addr()?;
        let url = format!("http://{}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = create_bridge_app(self.store, &self.config);

        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!(error = %e, "Bridge server failed");
            }
        });

        info!("Bridge server spawned on {}", url);
        Ok(ServerHandle {
            url,
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }
}

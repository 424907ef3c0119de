//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use gaia_runtime::{
    spawn_expiry_sweeper, spawn_fulfillment_pump, AnomalyMonitor, Coordinator, InMemoryStore,
    JsonLinesStore, LedgerStore, OracleInbox,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Gaia Daemon Server
pub struct Server {
    config: DaemonConfig,
    coordinator: Arc<Coordinator>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let store = open_store(&config.storage).await?;
        let coordinator = Arc::new(Coordinator::new(config.coordinator.clone(), store));

        Ok(Self {
            config,
            coordinator,
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let oracle = &self.config.coordinator.oracle;

        // Background tasks
        let (inbox, inbox_rx) = OracleInbox::channel(oracle.inbox_capacity);
        let pump = spawn_fulfillment_pump(self.coordinator.clone(), inbox_rx);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = spawn_expiry_sweeper(
            self.coordinator.clone(),
            oracle.sweep_interval(),
            shutdown_rx,
        );

        let monitor = AnomalyMonitor::new(&self.config.coordinator.monitor);
        let state = AppState::new(self.coordinator.clone(), inbox, monitor);
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Gaia daemon listening on {}", addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()));

        tracing::info!("Gaia daemon shutting down");

        let _ = shutdown_tx.send(true);
        if let Err(e) = sweeper.await {
            tracing::error!(error = %e, "Expiry sweeper ended abnormally");
        }

        // The router held the inbox senders; once they are gone the pump drains and exits
        match tokio::time::timeout(PUMP_DRAIN_TIMEOUT, pump).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Fulfillment pump ended abnormally"),
            Err(_) => tracing::warn!("Fulfillment pump did not drain before shutdown"),
        }

        served
    }
}

async fn open_store(config: &StorageConfig) -> DaemonResult<Arc<dyn LedgerStore>> {
    match config {
        StorageConfig::Memory => {
            tracing::info!("Using in-memory journal");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageConfig::File { path } => {
            let store = JsonLinesStore::open(path.clone())
                .await
                .map_err(|e| DaemonError::Store(e.to_string()))?;
            tracing::info!(path = %path.display(), "Using JSON-lines journal");
            Ok(Arc::new(store))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal").join("gaia.jsonl");
        let config = DaemonConfig {
            storage: StorageConfig::File { path: path.clone() },
            ..DaemonConfig::default()
        };

        let server = Server::new(config).await.unwrap();
        assert!(path.exists());
        assert!(!server.coordinator.is_paused().await);
    }
}

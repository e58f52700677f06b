use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use anyshare_registry::Registry;
use anyshare_store::FsObjectStore;
use anyshare_types::SystemClock;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// anyShare HTTP server.
pub struct AnyshareServer {
    config: Arc<ServerConfig>,
    registry: Registry,
}

impl AnyshareServer {
    pub fn new(config: ServerConfig, registry: Registry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    /// Open the payload directory and the snapshot named by `config` and
    /// build a server over them.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = FsObjectStore::open(&config.storage_root)?;
        let registry = Registry::open(
            config.registry_config(),
            Arc::new(store),
            Arc::new(SystemClock),
        )?;
        info!(
            records = registry.len()?,
            storage_root = %config.storage_root.display(),
            snapshot = %config.snapshot_path.display(),
            "registry opened"
        );
        Ok(Self::new(config, registry))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState {
            registry: self.registry.clone(),
            config: Arc::clone(&self.config),
        })
    }

    /// Serve until SIGINT or SIGTERM, then save the snapshot.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    ///
    /// In-flight requests drain once `shutdown` resolves; the snapshot is
    /// saved after that, whether or not serving failed.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(%addr, base_path = %self.config.base_path, "anyShare server listening");

        let sweeper = self.spawn_sweeper();
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::from);
        if let Some(task) = sweeper {
            task.abort();
        }

        info!("listener drained, saving snapshot");
        let registry = self.registry.clone();
        let saved = tokio::task::spawn_blocking(move || registry.save_snapshot())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        served?;
        saved?;
        info!(snapshot = %self.config.snapshot_path.display(), "snapshot saved");
        Ok(())
    }

    fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        if self.config.sweep_interval_secs == 0 {
            return None;
        }
        let period = Duration::from_secs(self.config.sweep_interval_secs);
        let registry = self.registry.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let registry = registry.clone();
                match tokio::task::spawn_blocking(move || registry.sweep()).await {
                    Ok(Ok(report)) => debug!(
                        evicted = report.evicted.len(),
                        retained = report.retained.len(),
                        "periodic sweep"
                    ),
                    Ok(Err(e)) => warn!(error = %e, "periodic sweep failed"),
                    Err(e) => warn!(error = %e, "periodic sweep task failed"),
                }
            }
        }))
    }
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            storage_root: dir.path().join("payloads"),
            snapshot_path: dir.path().join("map.json"),
            ..ServerConfig::default()
        };
        let server = AnyshareServer::open(config).unwrap();
        assert!(dir.path().join("payloads").is_dir());
        assert_eq!(server.registry().len().unwrap(), 0);
        assert_eq!(server.config().base_path, "/anyShare");
    }

    #[test]
    fn open_claims_id_named_files_in_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("payloads");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("notes"), b"stray").unwrap();
        std::fs::write(root.join("README.md"), b"stray").unwrap();

        let config = ServerConfig {
            storage_root: root.clone(),
            snapshot_path: dir.path().join("map.json"),
            ..ServerConfig::default()
        };
        AnyshareServer::open(config).unwrap();

        assert!(!root.join("notes").exists());
        assert!(root.join("README.md").exists());
    }

    #[test]
    fn open_rejects_invalid_config() {
        let config = ServerConfig {
            base_path: "nope".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            AnyshareServer::open(config),
            Err(ServerError::Config(_))
        ));
    }
}

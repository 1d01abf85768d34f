use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::instrument;

use crate::conn::serve_connection;
use crate::dispatch::Dispatcher;
use crate::registry::Registry;

/// Default listening endpoint (§6): `127.0.0.1:16000`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:16000";

/// Startup configuration for one server instance.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Whether the `system` actor is mounted, allowing runtime
    /// registration (§4.6).
    pub allow_register: bool,
    /// Where the `name -> path` actor manifest is persisted, if at all
    /// (§6 "Configuration persistence").
    pub manifest_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.parse().expect("valid default address"),
            allow_register: false,
            manifest_path: None,
        }
    }
}

/// The running server: an accept loop over `config.bind_addr`, dispatching
/// every request through a shared [`Dispatcher`] (§4.7).
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Builds a server, reloading any manifest-persisted actors before
    /// returning.
    pub async fn build(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new(config.manifest_path.clone()));
        registry.load_manifest().await;
        let dispatcher = Arc::new(Dispatcher::new(registry, config.allow_register));
        Self { config, dispatcher }
    }

    /// Binds the listening socket without yet serving connections, so
    /// callers (and tests) that need the resolved local address — e.g.
    /// after binding to port 0 — can observe it before the accept loop
    /// starts.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        // `tokio::net::TcpListener` sets `SO_REUSEADDR` on the underlying
        // socket before binding (mio's unix listener does this
        // unconditionally), satisfying §6 without a second socket crate.
        TcpListener::bind(self.config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.bind_addr))
    }

    /// Binds and serves connections until `shutdown` fires, draining
    /// in-flight connections rather than severing them (§4.7 "graceful
    /// stop").
    #[instrument(skip(self, shutdown), fields(addr = %self.config.bind_addr))]
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections on an already-bound `listener` until `shutdown`
    /// fires. Shutdown only stops the accept loop — every connection task
    /// already spawned is awaited to completion before this returns, so an
    /// in-flight request finishes rather than getting its future dropped
    /// mid-dispatch.
    pub async fn serve(&self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!(addr = %listener.local_addr().unwrap_or(self.config.bind_addr), "listening");

        let mut connections = tokio::task::JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = accepted.context("accept failed")?;
                    let dispatcher = Arc::clone(&self.dispatcher);
                    connections.spawn(async move {
                        serve_connection(stream, peer_addr, dispatcher).await;
                    });
                }
                _ = shutdown.changed() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracing::info!(in_flight = connections.len(), "draining in-flight connections");
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}

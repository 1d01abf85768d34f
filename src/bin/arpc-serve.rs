use std::path::PathBuf;

use anyhow::Context;
use arpc_server::{Server, ServerConfig, DEFAULT_ADDR};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Runs the arpc actor server.
#[derive(Debug, Parser)]
#[clap(name = "arpc-serve", version)]
struct Cli {
    /// Address to listen on.
    #[clap(long, default_value = DEFAULT_ADDR)]
    bind: std::net::SocketAddr,

    /// Mount the `system` actor, allowing `register_actor`/`unregister_actor`
    /// calls to load new actors at runtime.
    #[clap(long)]
    allow_register: bool,

    /// Where to persist the `name -> path` actor manifest. If omitted,
    /// registrations are in-memory only and do not survive a restart.
    #[clap(long)]
    manifest: Option<PathBuf>,

    /// Emit logs as JSON instead of the default human-readable format.
    #[clap(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(EnvFilter::from_default_env());
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = ServerConfig {
        bind_addr: cli.bind,
        allow_register: cli.allow_register,
        manifest_path: cli.manifest,
    };
    let server = Server::build(config).await;
    let listener = server.bind().await.context("failed to bind listener")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    server.serve(listener, shutdown_rx).await
}

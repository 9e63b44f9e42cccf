use clap::Parser;
use liftlog_core::{Config, Error, Result, Store};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog-server")]
#[command(about = "HTTP API for Liftlog workouts and progression", long_about = None)]
struct Cli {
    /// Override database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override listen address (e.g. 0.0.0.0:8080)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    liftlog_core::logging::init_with_level("info,tower_http=debug");

    let cli = Cli::parse();
    let config = Config::load()?;

    let db_path = cli.db.unwrap_or_else(|| config.data.database_path.clone());
    let addr = match cli.bind {
        Some(addr) => addr,
        None => config.server.socket_addr()?,
    };

    // One store for the whole process, shared by every request
    let store = Store::open(&db_path)?;
    let app = liftlog_server::router(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Io)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

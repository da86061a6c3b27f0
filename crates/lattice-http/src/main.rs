//! `lattice-http` server binary.

use anyhow::{Context, Result};
use clap::Parser;
use lattice::app::App;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serve a lattice workspace over HTTP
#[derive(Parser, Debug)]
#[command(name = "lattice-http")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a config file (default: find `.lattice/` from the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides `server.bind`)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lattice=info,lattice_http=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let app = match &args.config {
        Some(path) => App::from_config_file(path).await?,
        None => App::from_directory(&std::env::current_dir()?).await?,
    };

    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| app.config().server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let local = listener.local_addr()?;
    tracing::info!(%local, root = %app.root_dir().display(), "lattice-http listening");

    let router = lattice_http::router(app.graph().clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("lattice-http shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

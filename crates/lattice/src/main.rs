//! Lattice CLI binary.

use anyhow::Result;
use lattice::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the lattice CLI.
///
/// Uses tokio's current_thread runtime; every command is a short sequence of
/// store calls.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=lattice=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lattice=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting lattice CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Lattice CLI completed successfully");
    Ok(())
}

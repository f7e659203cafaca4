mod api;
mod bitquery;
mod config;
mod dates;
mod flows;
mod models;
mod query;
mod view;

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG overrides; info by default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Flow explorer starting...");

    let cfg = config::load()?;
    info!("  Bitquery URL: {}", cfg.bitquery_url);
    info!("  Network: {}", cfg.network);
    info!("  Explorer: {}", cfg.explorer_tx_url);

    let state = api::AppState::new(cfg)?;
    api::serve(state).await?;

    info!("Flow explorer stopped.");
    Ok(())
}

//! Listing backend for the steptract marketplace.
//!
//! A thin REST layer over a [`ListingRepository`]. Orders are signed and
//! settled client side; the backend stores what clients report and serves
//! it back. Two repositories are provided: [`MemoryRepository`] for local
//! use and tests, and [`PostgrestRepository`] for a Supabase `metadata`
//! table.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
pub use config::ServerConfig;

mod error;
pub use error::ServerError;

mod repository;
pub use repository::{
    ListingRepository, MarketContracts, MemoryRepository, PostgrestRepository, RepositoryError,
};

mod routes;
pub use routes::{router, AppState};

use eyre::WrapErr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber, filtered by `RUST_LOG` and defaulting to
/// `info`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Serve the backend described by `config` until interrupted.
pub async fn run(config: ServerConfig) -> eyre::Result<()> {
    let contracts = config.contracts();
    match config.supabase()? {
        Some((url, key)) => {
            info!(%url, "using supabase repository");
            serve(&config, PostgrestRepository::new(url, key, contracts)).await
        }
        None => {
            info!("supabase not configured, using in-memory repository");
            serve(&config, MemoryRepository::new(contracts)).await
        }
    }
}

async fn serve<R: ListingRepository>(config: &ServerConfig, repository: R) -> eyre::Result<()> {
    let app = router(AppState::new(repository), config.static_dir.as_deref());

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await.wrap_err_with(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}

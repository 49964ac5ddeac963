use anyhow::Context;
use config::{
    cors::init_cors, db::init_store, logger::initialize_logger, settings::Settings,
    startup::AppState,
};
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

mod app;
mod config;
mod controllers;
mod dtos;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    initialize_logger()?;

    info!("🚀 Server starting initialization...");

    let settings = Settings::from_env().context("Failed to load settings")?;

    // Initialize the poll store
    let store = init_store(&settings)
        .await
        .context("Failed to initialize poll store")?;

    let cors = init_cors(&settings.cors_origin)?;
    let addr = settings.server_addr;
    let app = app::create_app(AppState::new(store, settings), cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🚀 Server started successfully at {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

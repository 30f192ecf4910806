use std::sync::Arc;

use anyhow::Context;
use coursehub_server::api::{self, AppState};
use coursehub_server::clock::SystemClock;
use coursehub_server::config::{DEFAULT_CONFIG_FILE, ServerConfig};
use coursehub_server::db::init_pool_and_migrate;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    info!("starting coursehub server");
    info!("loading server config from {DEFAULT_CONFIG_FILE}");
    let config = ServerConfig::load(DEFAULT_CONFIG_FILE)
        .with_context(|| format!("failed to load server config from {DEFAULT_CONFIG_FILE}"))?;

    if config.jwt_secret == ServerConfig::default().jwt_secret {
        warn!("jwt_secret is the built-in default, set JWT_SECRET for real deployments");
    }

    let db = init_pool_and_migrate(&config.database_url)
        .await
        .context("failed to initialize database")?;

    let bind_addr = config.bind_addr.clone();
    let admin = config.admin.clone();
    let state = Arc::new(AppState::new(db, config, Arc::new(SystemClock)));

    if let Some(admin) = admin {
        state
            .auth
            .ensure_admin(&admin.username, &admin.email, &admin.password)
            .await
            .context("failed to create admin account")?;
    }

    let app = api::create_router(state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "server is ready, press Ctrl+C to shut down");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received, stopping server"),
        Err(err) => warn!(error = %err, "failed to listen for shutdown signal"),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

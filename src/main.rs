use anyhow::Context;
use tracing_subscriber::EnvFilter;

use zykor_api::config::{self, Environment};
use zykor_api::server::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, ZYKOR_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    let default_filter = if config.api.enable_request_logging {
        "zykor_api=debug,tower_http=debug"
    } else {
        "zykor_api=info,tower_http=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting Zykor API in {:?} mode", config.environment);
    tracing::debug!("Configuration: {:?}", config);

    if config.environment != Environment::Development && config.security.jwt_secret.is_empty() {
        anyhow::bail!("ZYKOR_JWT_SECRET must be set outside development");
    }
    if config.supabase.service_role_key.is_empty() {
        tracing::warn!("SUPABASE_SERVICE_ROLE_KEY is not set; data routes will answer 503");
    }

    let state = AppState::new(config.clone()).context("failed to build HTTP client")?;
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Zykor API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Zykor API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! GCM relay API server binary entrypoint.

use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gcm_common::config::AppConfig;

use gcm_api::routes::create_router;
use gcm_api::state::AppState;

/// Upper bound on an inbound request body (1000 tokens plus payload fits easily).
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("gcm_api=debug,gcm_notifier=debug,tower_http=debug")
    });
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting GCM relay API server...");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        gcm_url = %config.gcm_url,
        backoff_retries = config.backoff_retries,
        registration_ids_limit = config.registration_ids_limit,
        "Configuration loaded"
    );

    // Build application state
    let state = AppState::from_config(&config)?;

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.bind_addr;
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("GCM relay API server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Received shutdown signal, stopping gracefully...");
}

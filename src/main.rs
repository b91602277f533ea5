use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goldmaster::application::handlers::router;
use goldmaster::application::state::AppState;
use goldmaster::config::AppConfig;
use goldmaster::infrastructure::gemini_client::{GeminiClient, GeminiConfig};
use goldmaster::infrastructure::gemini_live::GeminiLiveTransport;
use goldmaster::persistence::init_store;
use goldmaster::secrets::load_api_key;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goldmaster=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Gold Master backend starting...");
    let config = AppConfig::from_env();

    let store = init_store(&config.data_dir)?;

    let api_key = match load_api_key() {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("{}; AI features will use their fallbacks", e);
            None
        }
    };

    let generator = Arc::new(GeminiClient::new(GeminiConfig {
        api_base: config.api_base.clone(),
        api_key: api_key.clone(),
        timeout: config.request_timeout(),
    })?);
    let transport = Arc::new(GeminiLiveTransport::new(
        &config.live_url,
        api_key,
        config.request_timeout(),
    ));

    let state = AppState::new(store, generator, transport, &config)?;
    let timers = state.spawn_timers(&config);
    info!("✓ {} background timers running", timers.len());

    let live = state.live.clone();
    let app = router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Server shutting down gracefully...");
    drop(timers);
    live.stop().await;

    info!("Shutdown complete");
    Ok(())
}

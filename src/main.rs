use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod crypto;
mod error;
mod models;
mod services;

use config::Config;
use services::{RateLimiter, RelayerService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_relayer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Arena Relayer");
    tracing::info!("Environment: {}", config.environment);
    if config.is_testnet() {
        tracing::info!("Relaying to a development chain (id {})", config.chain_id);
    }

    let relayer = Arc::new(RelayerService::from_config(&config)?);
    match relayer.submitter_status().await {
        Ok(status) => tracing::info!(
            "Submitter {:#x} on chain {} (balance {} wei), arena {:#x}",
            status.submitter,
            status.chain_id,
            status.balance,
            status.state_machine
        ),
        Err(e) => tracing::warn!("Could not read submitter status at startup: {}", e),
    }

    let limiter = Arc::new(RateLimiter::new(
        Duration::from_millis(config.rate_limit_window_ms),
        config.rate_limit_max_requests,
    ));
    services::start_background_services(limiter.clone(), &config);

    let app_state = api::AppState {
        relayer,
        limiter,
        config: config.clone(),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Signed intents
        .route("/join", post(api::intents::join))
        .route("/set-name", post(api::intents::set_name))
        .route("/move", post(api::intents::move_player))
        // Admin
        .route("/kick", post(api::admin::kick))
        // Reads
        .route("/sequence/{player}", get(api::sequence::get_sequence))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/*
 * Responsibility
 * - tracing init -> Config -> AppState -> Router
 * - apply middleware (claim header, request id / trace / timeout)
 * - axum::serve() with ConnectInfo so the client-ip fallback sees the peer address
 */
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderMap, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppEnv, Config};
use crate::middleware;
use crate::services::claims::build_claim_header;
use crate::state::AppState;

fn init_tracing(app_env: AppEnv, claim_debug: bool) {
    // RUST_LOG wins when set. Ex:
    // RUST_LOG=info,claim_header=debug,tower_http=debug cargo run
    let default_filter = if claim_debug {
        "info,claim_header=debug,tower_http=info"
    } else {
        "info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        // plain output in production
        .with(tracing_subscriber::fmt::layer().with_ansi(!app_env.is_production()))
        .init();
}

pub async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(config.app_env, config.claim_header.debug);

    tracing::info!(
        "starting in {:?} mode on {} (claim {:?} from {:?} -> {:?})",
        config.app_env,
        config.addr,
        config.claim_header.claim_field,
        config.claim_header.source_header,
        config.claim_header.destination_header,
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let claim_header = build_claim_header(config).context("invalid claim header settings")?;
    Ok(AppState::new(claim_header))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let destination = state.claim_header.destination().clone();

    // Stand-in for the downstream service: shows what it would receive.
    let echo = move |headers: HeaderMap| async move {
        headers
            .get(&destination)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    let router = Router::new().fallback(echo);
    let router = middleware::claim_header::apply(router, state);

    // /health is outside the claim layer
    let router = Router::new()
        .route("/health", get(health))
        .merge(router);

    middleware::http::apply(router, config.request_timeout)
}

async fn health() -> &'static str {
    "ok"
}

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use atelier_api::{
    auth::{self, AuthConfig, AuthService},
    config::{init_tracing, load_config, AppConfig},
    db,
    events::{self, EventSender},
    handlers::{self, AppServices},
    session, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting atelier-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db = Arc::new(
        db::establish_connection_from_app_config(&config)
            .await
            .context("Failed to connect to the database")?,
    );

    if config.auto_migrate {
        db::run_migrations(&db)
            .await
            .context("Failed to run database migrations")?;
    }

    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx));

    let auth_service = Arc::new(AuthService::new(
        AuthConfig::new(
            config.jwt_secret.clone(),
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            std::time::Duration::from_secs(config.jwt_expiration as u64),
        ),
        db.clone(),
    ));

    let services = AppServices::new(
        db.clone(),
        Arc::new(event_sender.clone()),
        auth_service.clone(),
        &config,
    );

    let state = AppState {
        db,
        config: config.clone(),
        event_sender,
        services,
    };

    let cors = build_cors_layer(&config)?;

    let app = Router::new()
        .route("/", get(|| async { "atelier-api" }))
        .route("/health", get(handlers::health_check))
        .nest("/api", atelier_api::api_routes())
        .layer(middleware::from_fn_with_state(
            config.clone(),
            session::cart_session_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            auth_service,
            auth::auth_context_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Builds the CORS layer from configuration. Explicit origins win; the
/// permissive fallback is limited to development or an explicit opt-in.
fn build_cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    if let Some(raw) = &config.cors_allowed_origins {
        let origins: Vec<_> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                o.parse()
                    .with_context(|| format!("Invalid CORS origin '{}'", o))
            })
            .collect::<Result<_>>()?;

        if !origins.is_empty() {
            let mut layer = CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                    http::Method::OPTIONS,
                ])
                .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);
            if config.cors_allow_credentials {
                layer = layer.allow_credentials(true);
            }
            return Ok(layer);
        }
    }

    if config.should_allow_permissive_cors() {
        warn!("CORS is permissive; do not use this outside development");
        return Ok(CorsLayer::permissive());
    }

    anyhow::bail!("No CORS origins configured for a non-development environment")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::get,
    Router,
};
use log::{error, info};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::shared::state::AppState;
use crate::statistics::configure_statistics_routes;
use crate::web::auth::auth_middleware;
use crate::web::{configure_public_routes, configure_session_routes};

use super::health_check;

/// Every route of the app. Everything except `/login` and `/health` requires a session.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let max_upload = app_state.config.upload.max_bytes;

    let protected = Router::new()
        .merge(configure_statistics_routes())
        .merge(configure_session_routes())
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(configure_public_routes())
        .route("/health", get(health_check))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(max_upload))
        // Cookie manager must wrap the auth middleware that reads the session cookie
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

pub async fn run_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let addr = app_state.config.bind_address();
    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

//! Liveness endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::RunQueryDsl;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let pool = state.conn.clone();
    let db_ok = tokio::task::spawn_blocking(move || {
        pool.get()
            .map(|mut conn| diesel::sql_query("SELECT 1").execute(&mut conn).is_ok())
            .unwrap_or(false)
    })
    .await
    .unwrap_or(false);

    let status = if db_ok { "healthy" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok
        })),
    )
}

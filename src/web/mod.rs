//! Session handling shared by every page: login, the auth gate and flash messages.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

pub mod auth;
pub mod auth_handlers;
pub mod flash;

/// Routes reachable without a session.
pub fn configure_public_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/login",
        get(auth_handlers::login_page).post(auth_handlers::login_submit),
    )
}

/// Logout sits behind the auth gate with the rest of the app.
pub fn configure_session_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/logout",
        get(auth_handlers::logout).post(auth_handlers::logout),
    )
}

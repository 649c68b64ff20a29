//! Authentication handlers for login and logout

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::shared::models::find_active_user;
use crate::shared::state::AppState;
use crate::statistics::ui::render_login;

use super::auth::{clear_auth_cookie, create_auth_cookie, AUTH_COOKIE};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Login form data
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Show login page
pub async fn login_page(State(state): State<Arc<AppState>>, cookies: Cookies) -> Response {
    let signed_in = cookies
        .get(AUTH_COOKIE)
        .and_then(|c| state.auth.validate_token(c.value()))
        .is_some();
    if signed_in {
        return Redirect::to("/").into_response();
    }
    Html(render_login(None, "")).into_response()
}

/// Handle login form submission
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let pool = state.conn.clone();
    let lookup_name = username.clone();
    let password = form.password;

    let verified = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let user = find_active_user(&mut conn, &lookup_name).map_err(|e| e.to_string())?;
        Ok::<_, String>(user.filter(|u| u.verify_password(&password)))
    })
    .await;

    let user = match verified {
        Ok(Ok(user)) => user,
        Ok(Err(e)) => {
            error!("[AUTH] Login lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_login(Some("Login is temporarily unavailable."), &username)),
            )
                .into_response();
        }
        Err(e) => {
            error!("[AUTH] Login task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(user) = user else {
        warn!("[AUTH] Failed login for '{}'", username);
        return Html(render_login(Some(INVALID_CREDENTIALS), &username)).into_response();
    };

    match state.auth.issue_token(&user.username, &user.id.to_string()) {
        Ok(token) => {
            cookies.add(create_auth_cookie(&token, state.auth.session_hours));
            info!("[AUTH] User '{}' logged in", user.username);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            error!("[AUTH] Failed to issue session token: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handle logout
pub async fn logout(cookies: Cookies) -> Redirect {
    clear_auth_cookie(&cookies);
    Redirect::to("/login")
}

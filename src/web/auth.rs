//! Cookie-carried session tokens and the middleware that gates every page.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use crate::core::config::AuthSettings;
use crate::shared::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| {
            if auth.to_lowercase().starts_with("bearer ") {
                Some(auth[7..].to_string())
            } else {
                None
            }
        })
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // username
    pub uid: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    pub session_hours: i64,
}

impl AuthConfig {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let jwt_secret = match settings.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                warn!("[AUTH] No jwt_secret configured, sessions will not survive a restart");
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
        };

        Self {
            jwt_secret,
            session_hours: settings.session_hours,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn issue_token(
        &self,
        username: &str,
        user_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id.to_string(),
            exp: (now + Duration::hours(self.session_hours)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key())
    }

    pub fn validate_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key(), &Validation::default())
            .map(|data| data.claims)
            .ok()
    }
}

/// Signed-in user, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
        }
    }
}

/// Pages redirect to the login form; `/api/` callers get a 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(request.headers())
        .or_else(|| cookies.get(AUTH_COOKIE).map(|c| c.value().to_string()));

    match token.and_then(|t| state.auth.validate_token(&t)) {
        Some(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(claims));
            next.run(request).await
        }
        None => {
            let path = request.uri().path();
            debug!("[AUTH] Rejecting unauthenticated request to {}", path);
            if path.starts_with("/api/") {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "Authentication required" })),
                )
                    .into_response()
            } else {
                Redirect::to("/login").into_response()
            }
        }
    }
}

/// Helper to create secure auth cookie
pub fn create_auth_cookie(token: &str, expires_in_hours: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(expires_in_hours))
        .build()
}

pub fn clear_auth_cookie(cookies: &Cookies) {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
}

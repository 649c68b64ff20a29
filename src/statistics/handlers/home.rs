use axum::{extract::State, response::Html, Extension};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::shared::state::AppState;
use crate::statistics::error::StatisticsError;
use crate::statistics::queries::{dashboard_overview, master_listing};
use crate::statistics::ui::{render_home, render_master_listing};
use crate::web::auth::AuthenticatedUser;

use super::{page_context, run_blocking};

pub async fn handle_dashboard_home(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
) -> Result<Html<String>, StatisticsError> {
    let overview = run_blocking(&state, |conn| Ok(dashboard_overview(conn)?)).await?;
    Ok(Html(render_home(&overview, &page_context(&user, &cookies))))
}

pub async fn handle_master_parameters(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
) -> Result<Html<String>, StatisticsError> {
    let listing = run_blocking(&state, |conn| Ok(master_listing(conn)?)).await?;
    Ok(Html(render_master_listing(
        &listing,
        &page_context(&user, &cookies),
    )))
}

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::shared::state::AppState;
use crate::statistics::error::StatisticsError;
use crate::statistics::queries::{
    total_transaction_list, total_transaction_summary, total_user_list, total_user_summary,
};
use crate::statistics::types::{
    TotalTransactionListQuery, TotalUserListQuery, TransactionSummaryQuery, UserSummaryQuery,
};
use crate::statistics::ui::{
    render_total_transaction_list, render_total_user_list, render_transaction_summary,
    render_user_summary,
};
use crate::web::auth::AuthenticatedUser;

use super::{page_context, run_blocking};

pub async fn handle_total_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
    Query(query): Query<TotalUserListQuery>,
) -> Result<Html<String>, StatisticsError> {
    let status = query.status();
    let list = run_blocking(&state, move |conn| {
        Ok(total_user_list(conn, status, query.page.as_deref())?)
    })
    .await?;
    Ok(Html(render_total_user_list(
        &list,
        &page_context(&user, &cookies),
    )))
}

pub async fn handle_total_users_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
    Query(query): Query<UserSummaryQuery>,
) -> Result<Html<String>, StatisticsError> {
    let filter = query.filter();
    let summary = run_blocking(&state, move |conn| {
        Ok(total_user_summary(conn, &filter, query.page.as_deref())?)
    })
    .await?;
    Ok(Html(render_user_summary(
        &summary,
        &page_context(&user, &cookies),
    )))
}

pub async fn handle_total_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
    Query(query): Query<TotalTransactionListQuery>,
) -> Result<Html<String>, StatisticsError> {
    let transaction_type_id = query.transaction_type_id();
    let list = run_blocking(&state, move |conn| {
        Ok(total_transaction_list(
            conn,
            transaction_type_id,
            query.page.as_deref(),
        )?)
    })
    .await?;
    Ok(Html(render_total_transaction_list(
        &list,
        &page_context(&user, &cookies),
    )))
}

pub async fn handle_total_transactions_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
    Query(query): Query<TransactionSummaryQuery>,
) -> Result<Html<String>, StatisticsError> {
    let filter = query.filter();
    let summary = run_blocking(&state, move |conn| {
        Ok(total_transaction_summary(
            conn,
            &filter,
            query.page.as_deref(),
        )?)
    })
    .await?;
    Ok(Html(render_transaction_summary(
        &summary,
        &page_context(&user, &cookies),
    )))
}

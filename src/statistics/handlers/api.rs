use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use log::info;
use std::sync::Arc;

use crate::shared::state::AppState;
use crate::statistics::chart::ChartData;
use crate::statistics::error::StatisticsError;
use crate::statistics::pagination::Page;
use crate::statistics::queries::{
    chart_data, create_master, insert_total_transaction, insert_total_user, list_upload_logs,
};
use crate::statistics::storage::{DbDataUploadLog, DbTotalTransaction, DbTotalUser};
use crate::statistics::types::{
    CreateMasterRequest, CreateTotalTransactionRequest, CreateTotalUserRequest, MasterRecord,
    PageQuery,
};

use super::run_blocking;

pub async fn handle_dashboard_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartData>, StatisticsError> {
    let data = run_blocking(&state, |conn| Ok(chart_data(conn)?)).await?;
    Ok(Json(data))
}

pub async fn handle_create_master(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(req): Json<CreateMasterRequest>,
) -> Result<Json<MasterRecord>, StatisticsError> {
    let record = run_blocking(&state, move |conn| {
        create_master(conn, &kind, &req.name, req.code.as_deref())
    })
    .await?;
    Ok(Json(record))
}

pub async fn handle_create_total_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTotalUserRequest>,
) -> Result<(StatusCode, Json<DbTotalUser>), StatisticsError> {
    let row = req.validate()?;
    let created = run_blocking(&state, move |conn| insert_total_user(conn, &row)).await?;
    info!(
        "[STATS] Added total user rollup {} for {}",
        created.id, created.fiscal_year
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn handle_create_total_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTotalTransactionRequest>,
) -> Result<(StatusCode, Json<DbTotalTransaction>), StatisticsError> {
    let row = req.validate()?;
    let created = run_blocking(&state, move |conn| insert_total_transaction(conn, &row)).await?;
    info!(
        "[STATS] Added total transaction rollup {} for {}",
        created.id, created.fiscal_year
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn handle_list_upload_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<DbDataUploadLog>>, StatisticsError> {
    let page = run_blocking(&state, move |conn| {
        Ok(list_upload_logs(conn, query.page.as_deref())?)
    })
    .await?;
    Ok(Json(page))
}

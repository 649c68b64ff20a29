pub mod chart;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod pagination;
pub mod queries;
pub mod storage;
pub mod store;
pub mod types;
pub mod ui;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use error::{IngestError, StatisticsError};
pub use handlers::*;
pub use store::{PgStore, StatisticsStore};
pub use types::*;

pub fn configure_statistics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handle_dashboard_home))
        .route("/master-parameters", get(handle_master_parameters))
        .route(
            "/data-upload",
            get(handle_upload_page).post(handle_upload_submit),
        )
        .route("/data-tables", get(handle_data_tables))
        .route("/total-users", get(handle_total_users))
        .route("/total-users/summary", get(handle_total_users_summary))
        .route("/total-transactions", get(handle_total_transactions))
        .route(
            "/total-transactions/summary",
            get(handle_total_transactions_summary),
        )
        .route("/api/dashboard-data", get(handle_dashboard_data))
        .route("/api/masters/:kind", post(handle_create_master))
        .route("/api/total-users", post(handle_create_total_user))
        .route("/api/total-transactions", post(handle_create_total_transaction))
        .route("/api/upload-logs", get(handle_list_upload_logs))
}

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::shared::state::AppState;
use crate::statistics::error::StatisticsError;
use crate::statistics::queries::{customer_table, transaction_table};
use crate::statistics::types::{DataTable, DataTablesQuery};
use crate::statistics::ui::{render_data_tables, DataTablePage};
use crate::web::auth::AuthenticatedUser;

use super::{page_context, run_blocking};

pub async fn handle_data_tables(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
    Query(query): Query<DataTablesQuery>,
) -> Result<Html<String>, StatisticsError> {
    let table = query.table();
    let page = query.page;
    let data = run_blocking(&state, move |conn| {
        Ok(match table {
            DataTable::Customer => DataTablePage::Customer(customer_table(conn, page.as_deref())?),
            DataTable::Transaction => {
                DataTablePage::Transaction(transaction_table(conn, page.as_deref())?)
            }
        })
    })
    .await?;
    Ok(Html(render_data_tables(&data, &page_context(&user, &cookies))))
}

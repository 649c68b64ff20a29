//! Read models behind the pages and the chart endpoint, plus the rollup inserts used by
//! the admin API.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use diesel::dsl::sum;
use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::BTreeMap;

use crate::core::shared::schema::statistics::{
    branches, customer_data, data_upload_logs, service_types, total_transactions, total_users,
    transaction_data,
};
use crate::shared::{next_month, CustomerStatus};

use super::chart::{self, ChartData};
use super::error::StatisticsError;
use super::pagination::{
    paginate_vec, Page, PageInfo, DATA_TABLE_PAGE_SIZE, ROLLUP_PAGE_SIZE, UPLOAD_LOG_PAGE_SIZE,
};
use super::storage::{
    db_customer_data_to_view, db_total_transaction_to_view, db_total_user_to_view,
    db_transaction_data_to_view, distinct_ids, get_or_create_branch, get_or_create_master,
    list_branches, list_masters, master_exists, DbBranch, DbCustomerData, DbDataUploadLog, DbMaster,
    DbTotalTransaction, DbTotalUser, DbTransactionData, MasterNames, NewTotalTransaction,
    NewTotalUser,
};
use super::types::{
    CustomerDataView, DashboardCounts, DashboardOverview, FilterOptions, MasterGroup, MasterKind,
    MasterListing, MasterRecord, TotalTransactionList, TotalUserList, TransactionDataView,
    TransactionSummary, TransactionSummaryFilter, TransactionTotals, UserSummary,
    UserSummaryFilter, UserSummaryRow,
};

pub const RECENT_UPLOADS: i64 = 5;

// ============================================================================
// Home and masters
// ============================================================================

pub fn dashboard_counts(conn: &mut PgConnection) -> QueryResult<DashboardCounts> {
    Ok(DashboardCounts {
        total_branches: branches::table.count().get_result(conn)?,
        total_customer_records: customer_data::table.count().get_result(conn)?,
        total_transaction_records: transaction_data::table.count().get_result(conn)?,
    })
}

pub fn recent_uploads(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<DbDataUploadLog>> {
    data_upload_logs::table
        .select(DbDataUploadLog::as_select())
        .order((data_upload_logs::upload_date.desc(), data_upload_logs::id.desc()))
        .limit(limit)
        .load(conn)
}

pub fn dashboard_overview(conn: &mut PgConnection) -> QueryResult<DashboardOverview> {
    Ok(DashboardOverview {
        counts: dashboard_counts(conn)?,
        recent_uploads: recent_uploads(conn, RECENT_UPLOADS)?,
    })
}

pub fn list_upload_logs(
    conn: &mut PgConnection,
    page: Option<&str>,
) -> QueryResult<Page<DbDataUploadLog>> {
    let total = data_upload_logs::table.count().get_result(conn)?;
    let info = PageInfo::resolve(page, total, UPLOAD_LOG_PAGE_SIZE);
    let items = data_upload_logs::table
        .select(DbDataUploadLog::as_select())
        .order((data_upload_logs::upload_date.desc(), data_upload_logs::id.desc()))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;
    Ok(Page { items, info })
}

pub fn master_listing(conn: &mut PgConnection) -> QueryResult<MasterListing> {
    let mut groups = Vec::with_capacity(MasterKind::ALL.len());
    for kind in MasterKind::ALL {
        groups.push(MasterGroup {
            kind,
            entries: list_masters(conn, kind)?,
        });
    }
    Ok(MasterListing {
        branches: list_branches(conn)?,
        groups,
    })
}

/// Get-or-create for the admin API. `kind` is a [`MasterKind`] slug or `branch`.
pub fn create_master(
    conn: &mut PgConnection,
    kind: &str,
    name: &str,
    code: Option<&str>,
) -> Result<MasterRecord, StatisticsError> {
    let name = name.trim();
    if kind == "branch" {
        let code = code.map(str::trim).unwrap_or_default();
        if code.is_empty() {
            return Err(StatisticsError::Validation(
                "Branch code is required".to_string(),
            ));
        }
        let id = get_or_create_branch(conn, code, name)?;
        let branch = branches::table
            .find(id)
            .select(DbBranch::as_select())
            .first(conn)?;
        return Ok(MasterRecord::Branch(branch));
    }

    let kind: MasterKind = kind.parse().map_err(StatisticsError::NotFound)?;
    if name.is_empty() {
        return Err(StatisticsError::Validation("Name is required".to_string()));
    }
    let id = get_or_create_master(conn, kind, name)?;
    Ok(MasterRecord::Named(DbMaster {
        id,
        name: name.to_string(),
    }))
}

// ============================================================================
// Detail tables
// ============================================================================

pub fn customer_table(
    conn: &mut PgConnection,
    page: Option<&str>,
) -> QueryResult<Page<CustomerDataView>> {
    let total = customer_data::table.count().get_result(conn)?;
    let info = PageInfo::resolve(page, total, DATA_TABLE_PAGE_SIZE);
    let items: Vec<DbCustomerData> = customer_data::table
        .inner_join(branches::table)
        .select(DbCustomerData::as_select())
        .order((
            customer_data::month_year.desc(),
            branches::code.asc(),
            customer_data::id.asc(),
        ))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;

    let names = MasterNames::for_customer_rows(conn, &items)?;
    Ok(Page { items, info }.map(|row| db_customer_data_to_view(row, &names)))
}

pub fn transaction_table(
    conn: &mut PgConnection,
    page: Option<&str>,
) -> QueryResult<Page<TransactionDataView>> {
    let total = transaction_data::table.count().get_result(conn)?;
    let info = PageInfo::resolve(page, total, DATA_TABLE_PAGE_SIZE);
    let items: Vec<DbTransactionData> = transaction_data::table
        .select(DbTransactionData::as_select())
        .order((
            transaction_data::month_year.desc(),
            transaction_data::range_of_transactions.asc(),
            transaction_data::id.asc(),
        ))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;

    let names = MasterNames::for_transaction_rows(conn, &items)?;
    Ok(Page { items, info }.map(|row| db_transaction_data_to_view(row, &names)))
}

// ============================================================================
// Rollup lists
// ============================================================================

fn total_users_by_status<'a>(status: Option<CustomerStatus>) -> total_users::BoxedQuery<'a, Pg> {
    let mut query = total_users::table.into_boxed();
    if let Some(status) = status {
        query = query.filter(total_users::status.eq(status));
    }
    query
}

pub fn total_user_list(
    conn: &mut PgConnection,
    status: Option<CustomerStatus>,
    page: Option<&str>,
) -> QueryResult<TotalUserList> {
    let total = total_users_by_status(status).count().get_result(conn)?;
    let info = PageInfo::resolve(page, total, ROLLUP_PAGE_SIZE);
    let items: Vec<DbTotalUser> = total_users_by_status(status)
        .select(DbTotalUser::as_select())
        .order((total_users::month_year.desc(), total_users::id.desc()))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;

    let mut names = MasterNames::default();
    names.load_kind(
        conn,
        MasterKind::ServiceType,
        &distinct_ids(&items, |r| r.service_type_id),
    )?;
    Ok(TotalUserList {
        page: Page { items, info }.map(|row| db_total_user_to_view(row, &names)),
        status,
    })
}

pub fn total_transaction_list(
    conn: &mut PgConnection,
    transaction_type_id: Option<i32>,
    page: Option<&str>,
) -> QueryResult<TotalTransactionList> {
    let filter = TransactionSummaryFilter {
        transaction_type_id,
        ..Default::default()
    };
    let total = filter.apply(total_transactions::table.into_boxed()).count().get_result(conn)?;
    let info = PageInfo::resolve(page, total, ROLLUP_PAGE_SIZE);
    let items: Vec<DbTotalTransaction> = filter
        .apply(total_transactions::table.into_boxed())
        .select(DbTotalTransaction::as_select())
        .order((total_transactions::month_year.desc(), total_transactions::id.desc()))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;

    let names = MasterNames::for_total_transactions(conn, &items)?;
    Ok(TotalTransactionList {
        page: Page { items, info }.map(|row| db_total_transaction_to_view(row, &names)),
        transaction_types: list_masters(conn, MasterKind::TransactionType)?,
        transaction_type_id,
    })
}

// ============================================================================
// Summaries
// ============================================================================

impl UserSummaryFilter {
    pub fn apply<'a>(
        &self,
        mut query: total_users::BoxedQuery<'a, Pg>,
    ) -> total_users::BoxedQuery<'a, Pg> {
        if let Some(fiscal_year) = &self.fiscal_year {
            query = query.filter(total_users::fiscal_year.eq(fiscal_year.clone()));
        }
        if let Some(month) = self.month {
            query = query
                .filter(total_users::month_year.ge(month))
                .filter(total_users::month_year.lt(next_month(month)));
        }
        query
    }
}

impl TransactionSummaryFilter {
    pub fn apply<'a>(
        &self,
        mut query: total_transactions::BoxedQuery<'a, Pg>,
    ) -> total_transactions::BoxedQuery<'a, Pg> {
        if let Some(id) = self.transaction_range_id {
            query = query.filter(total_transactions::transaction_range_id.eq(id));
        }
        if let Some(id) = self.transaction_type_id {
            query = query.filter(total_transactions::transaction_type_id.eq(id));
        }
        if let Some(id) = self.instrument_type_id {
            query = query.filter(total_transactions::instrument_type_id.eq(id));
        }
        if let Some(id) = self.geographical_location_id {
            query = query.filter(total_transactions::geographical_location_id.eq(id));
        }
        if let Some(id) = self.channel_used_id {
            query = query.filter(total_transactions::channel_used_id.eq(id));
        }
        if let Some(min) = self.min_transactions {
            query = query.filter(total_transactions::number_of_transactions.ge(min));
        }
        if let Some(max) = self.max_transactions {
            query = query.filter(total_transactions::number_of_transactions.le(max));
        }
        query
    }
}

/// Folds `(month, service type, status, total)` sums into one row per month and service,
/// ordered by month then service name.
pub fn pivot_user_summary(rows: Vec<(NaiveDate, String, CustomerStatus, i64)>) -> Vec<UserSummaryRow> {
    let mut grouped: BTreeMap<(NaiveDate, String), (i64, i64)> = BTreeMap::new();
    for (month, service, status, total) in rows {
        let entry = grouped.entry((month, service)).or_default();
        match status {
            CustomerStatus::Active => entry.0 += total,
            CustomerStatus::Inactive => entry.1 += total,
        }
    }
    grouped
        .into_iter()
        .map(|((month_year, service_type), (active_count, inactive_count))| UserSummaryRow {
            month_year,
            service_type,
            active_count,
            inactive_count,
        })
        .collect()
}

pub fn total_user_summary(
    conn: &mut PgConnection,
    filter: &UserSummaryFilter,
    page: Option<&str>,
) -> QueryResult<UserSummary> {
    let sums: Vec<(NaiveDate, i32, CustomerStatus, Option<i64>)> = filter
        .apply(total_users::table.into_boxed())
        .group_by((
            total_users::month_year,
            total_users::service_type_id,
            total_users::status,
        ))
        .select((
            total_users::month_year,
            total_users::service_type_id,
            total_users::status,
            sum(total_users::count),
        ))
        .load(conn)?;

    let mut names = MasterNames::default();
    names.load_kind(
        conn,
        MasterKind::ServiceType,
        &distinct_ids(&sums, |(_, service_type_id, _, _)| *service_type_id),
    )?;
    let rows = sums
        .into_iter()
        .map(|(month, service_type_id, status, total)| {
            (
                month,
                names.name(MasterKind::ServiceType, service_type_id),
                status,
                total.unwrap_or(0),
            )
        })
        .collect();

    Ok(UserSummary {
        page: paginate_vec(pivot_user_summary(rows), page, ROLLUP_PAGE_SIZE),
        filter: filter.clone(),
    })
}

pub fn filter_options(conn: &mut PgConnection) -> QueryResult<FilterOptions> {
    Ok(FilterOptions {
        transaction_ranges: list_masters(conn, MasterKind::TransactionRange)?,
        transaction_types: list_masters(conn, MasterKind::TransactionType)?,
        instrument_types: list_masters(conn, MasterKind::InstrumentType)?,
        geographical_locations: list_masters(conn, MasterKind::GeographicalLocation)?,
        channels_used: list_masters(conn, MasterKind::ChannelUsed)?,
    })
}

pub fn total_transaction_summary(
    conn: &mut PgConnection,
    filter: &TransactionSummaryFilter,
    page: Option<&str>,
) -> QueryResult<TransactionSummary> {
    let (total_count, total_amount): (Option<i64>, Option<BigDecimal>) = filter
        .apply(total_transactions::table.into_boxed())
        .select((
            sum(total_transactions::number_of_transactions),
            sum(total_transactions::amount),
        ))
        .first(conn)?;

    let total = filter
        .apply(total_transactions::table.into_boxed())
        .count()
        .get_result(conn)?;
    let info = PageInfo::resolve(page, total, ROLLUP_PAGE_SIZE);
    let items: Vec<DbTotalTransaction> = filter
        .apply(total_transactions::table.into_boxed())
        .select(DbTotalTransaction::as_select())
        .order((total_transactions::month_year.desc(), total_transactions::id.desc()))
        .offset(info.offset())
        .limit(info.per_page)
        .load(conn)?;

    let names = MasterNames::for_total_transactions(conn, &items)?;
    Ok(TransactionSummary {
        page: Page { items, info }.map(|row| db_total_transaction_to_view(row, &names)),
        totals: TransactionTotals {
            total_transactions: total_count.unwrap_or(0),
            total_amount: total_amount.unwrap_or_default(),
        },
        options: filter_options(conn)?,
        filter: filter.clone(),
    })
}

// ============================================================================
// Charts
// ============================================================================

pub fn chart_data(conn: &mut PgConnection) -> QueryResult<ChartData> {
    let customers: Vec<(NaiveDate, String, Option<i64>)> = total_users::table
        .inner_join(service_types::table)
        .group_by((total_users::month_year, service_types::name))
        .select((
            total_users::month_year,
            service_types::name,
            sum(total_users::count),
        ))
        .load(conn)?;

    let transactions: Vec<(NaiveDate, Option<BigDecimal>)> = total_transactions::table
        .group_by(total_transactions::month_year)
        .select((total_transactions::month_year, sum(total_transactions::amount)))
        .load(conn)?;

    let customers: Vec<_> = customers
        .into_iter()
        .map(|(month, service, total)| (month, service, total.unwrap_or(0)))
        .collect();
    let transactions: Vec<_> = transactions
        .into_iter()
        .map(|(month, total)| (month, total.unwrap_or_default()))
        .collect();

    Ok(ChartData {
        monthly_customers: chart::monthly_customers(&customers),
        monthly_transactions: chart::monthly_transactions(&transactions),
    })
}

// ============================================================================
// Rollup inserts
// ============================================================================

fn require_master(
    conn: &mut PgConnection,
    kind: MasterKind,
    id: i32,
) -> Result<(), StatisticsError> {
    if master_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(StatisticsError::Validation(format!(
            "Unknown {} id {id}",
            kind.slug()
        )))
    }
}

pub fn insert_total_user(
    conn: &mut PgConnection,
    row: &NewTotalUser,
) -> Result<DbTotalUser, StatisticsError> {
    require_master(conn, MasterKind::ServiceType, row.service_type_id)?;
    Ok(diesel::insert_into(total_users::table)
        .values(row)
        .returning(DbTotalUser::as_returning())
        .get_result(conn)?)
}

pub fn insert_total_transaction(
    conn: &mut PgConnection,
    row: &NewTotalTransaction,
) -> Result<DbTotalTransaction, StatisticsError> {
    require_master(conn, MasterKind::TransactionRange, row.transaction_range_id)?;
    require_master(conn, MasterKind::TransactionType, row.transaction_type_id)?;
    require_master(conn, MasterKind::InstrumentType, row.instrument_type_id)?;
    require_master(conn, MasterKind::GeographicalLocation, row.geographical_location_id)?;
    require_master(conn, MasterKind::ChannelUsed, row.channel_used_id)?;
    Ok(diesel::insert_into(total_transactions::table)
        .values(row)
        .returning(DbTotalTransaction::as_returning())
        .get_result(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
    }

    #[test]
    fn test_pivot_splits_active_and_inactive() {
        let rows = vec![
            (month(2), "Mobile Banking".to_string(), CustomerStatus::Active, 40),
            (month(1), "Mobile Banking".to_string(), CustomerStatus::Inactive, 5),
            (month(1), "Mobile Banking".to_string(), CustomerStatus::Active, 30),
            (month(1), "Internet Banking".to_string(), CustomerStatus::Active, 12),
        ];
        let summary = pivot_user_summary(rows);
        assert_eq!(
            summary,
            vec![
                UserSummaryRow {
                    month_year: month(1),
                    service_type: "Internet Banking".to_string(),
                    active_count: 12,
                    inactive_count: 0,
                },
                UserSummaryRow {
                    month_year: month(1),
                    service_type: "Mobile Banking".to_string(),
                    active_count: 30,
                    inactive_count: 5,
                },
                UserSummaryRow {
                    month_year: month(2),
                    service_type: "Mobile Banking".to_string(),
                    active_count: 40,
                    inactive_count: 0,
                },
            ]
        );
    }

    #[test]
    fn test_pivot_sums_duplicate_rollups() {
        let rows = vec![
            (month(1), "SMS".to_string(), CustomerStatus::Active, 3),
            (month(1), "SMS".to_string(), CustomerStatus::Active, 4),
        ];
        assert_eq!(pivot_user_summary(rows)[0].active_count, 7);
    }
}

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::core::shared::schema::statistics::{
    branches, customer_data, data_upload_logs, total_transactions, total_users, transaction_data,
};
use crate::shared::{CustomerStatus, DataType, UploadStatus};

use super::types::{
    CustomerDataView, MasterKind, TotalTransactionView, TotalUserView, TransactionDataView,
};

/// Runs `$body` with `$table` bound to the schema module of the given master kind.
macro_rules! with_master_table {
    ($kind:expr, |$table:ident| $body:expr) => {
        match $kind {
            MasterKind::CustomerCategory => {
                use crate::core::shared::schema::statistics::customer_categories as $table;
                $body
            }
            MasterKind::ServiceType => {
                use crate::core::shared::schema::statistics::service_types as $table;
                $body
            }
            MasterKind::TransactionRange => {
                use crate::core::shared::schema::statistics::transaction_ranges as $table;
                $body
            }
            MasterKind::TransactionType => {
                use crate::core::shared::schema::statistics::transaction_types as $table;
                $body
            }
            MasterKind::InstrumentType => {
                use crate::core::shared::schema::statistics::instrument_types as $table;
                $body
            }
            MasterKind::GeographicalLocation => {
                use crate::core::shared::schema::statistics::geographical_locations as $table;
                $body
            }
            MasterKind::ChannelUsed => {
                use crate::core::shared::schema::statistics::channels_used as $table;
                $body
            }
        }
    };
}

pub(crate) use with_master_table;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = branches)]
pub struct DbBranch {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// Row of any name-only master table.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
pub struct DbMaster {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = customer_data)]
pub struct NewCustomerData {
    pub branch_id: i32,
    pub customer_category_id: i32,
    pub service_type_id: i32,
    pub status: CustomerStatus,
    pub number_of_customers: i32,
    pub month_year: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = customer_data)]
pub struct DbCustomerData {
    pub id: i64,
    pub branch_id: i32,
    pub customer_category_id: i32,
    pub service_type_id: i32,
    pub status: CustomerStatus,
    pub number_of_customers: i32,
    pub month_year: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = transaction_data)]
pub struct NewTransactionData {
    pub month_year: NaiveDate,
    pub range_of_transactions: String,
    pub instrument_type_id: i32,
    pub transaction_type_id: i32,
    pub geographical_location_id: i32,
    pub channel_used_id: i32,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = transaction_data)]
pub struct DbTransactionData {
    pub id: i64,
    pub month_year: NaiveDate,
    pub range_of_transactions: String,
    pub instrument_type_id: i32,
    pub transaction_type_id: i32,
    pub geographical_location_id: i32,
    pub channel_used_id: i32,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = total_users)]
pub struct NewTotalUser {
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub service_type_id: i32,
    pub status: CustomerStatus,
    pub count: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = total_users)]
pub struct DbTotalUser {
    pub id: i64,
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub service_type_id: i32,
    pub status: CustomerStatus,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = total_transactions)]
pub struct NewTotalTransaction {
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub transaction_range_id: i32,
    pub transaction_type_id: i32,
    pub instrument_type_id: i32,
    pub geographical_location_id: i32,
    pub channel_used_id: i32,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = total_transactions)]
pub struct DbTotalTransaction {
    pub id: i64,
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub transaction_range_id: i32,
    pub transaction_type_id: i32,
    pub instrument_type_id: i32,
    pub geographical_location_id: i32,
    pub channel_used_id: i32,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = data_upload_logs)]
pub struct NewDataUploadLog {
    pub month_year: NaiveDate,
    pub data_type: DataType,
    pub file_name: String,
    pub records_uploaded: i32,
    pub status: UploadStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = data_upload_logs)]
pub struct DbDataUploadLog {
    pub id: i64,
    pub upload_date: DateTime<Utc>,
    pub month_year: NaiveDate,
    pub data_type: DataType,
    pub file_name: String,
    pub records_uploaded: i32,
    pub status: UploadStatus,
    pub error_message: Option<String>,
}

// ============================================================================
// Master lookups
// ============================================================================

pub fn get_or_create_master(
    conn: &mut PgConnection,
    kind: MasterKind,
    name: &str,
) -> QueryResult<i32> {
    with_master_table!(kind, |t| {
        diesel::insert_into(t::table)
            .values(t::name.eq(name))
            .on_conflict(t::name)
            .do_nothing()
            .execute(conn)?;
        t::table
            .filter(t::name.eq(name))
            .select(t::id)
            .first::<i32>(conn)
    })
}

/// Branches are keyed by code; `name` only applies when the branch is new.
pub fn get_or_create_branch(conn: &mut PgConnection, code: &str, name: &str) -> QueryResult<i32> {
    diesel::insert_into(branches::table)
        .values((branches::code.eq(code), branches::name.eq(name)))
        .on_conflict(branches::code)
        .do_nothing()
        .execute(conn)?;
    branches::table
        .filter(branches::code.eq(code))
        .select(branches::id)
        .first(conn)
}

pub fn list_masters(conn: &mut PgConnection, kind: MasterKind) -> QueryResult<Vec<DbMaster>> {
    with_master_table!(kind, |t| {
        t::table
            .select((t::id, t::name))
            .order(t::name.asc())
            .load::<DbMaster>(conn)
    })
}

pub fn list_branches(conn: &mut PgConnection) -> QueryResult<Vec<DbBranch>> {
    branches::table
        .select(DbBranch::as_select())
        .order(branches::code.asc())
        .load(conn)
}

pub fn master_exists(conn: &mut PgConnection, kind: MasterKind, id: i32) -> QueryResult<bool> {
    with_master_table!(kind, |t| {
        diesel::select(diesel::dsl::exists(t::table.filter(t::id.eq(id)))).get_result(conn)
    })
}

// ============================================================================
// Display names
// ============================================================================

/// Id to display-name maps for the master rows referenced by one page of fact rows.
#[derive(Debug, Clone, Default)]
pub struct MasterNames {
    branches: HashMap<i32, DbBranch>,
    names: HashMap<MasterKind, HashMap<i32, String>>,
}

/// Sorted, deduplicated ids picked from `rows`.
pub fn distinct_ids<T>(rows: &[T], id: impl Fn(&T) -> i32) -> Vec<i32> {
    rows.iter().map(id).collect::<BTreeSet<_>>().into_iter().collect()
}

impl MasterNames {
    pub fn for_customer_rows(conn: &mut PgConnection, rows: &[DbCustomerData]) -> QueryResult<Self> {
        let mut names = Self::default();
        names.load_branches(conn, &distinct_ids(rows, |r| r.branch_id))?;
        names.load_kind(
            conn,
            MasterKind::CustomerCategory,
            &distinct_ids(rows, |r| r.customer_category_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::ServiceType,
            &distinct_ids(rows, |r| r.service_type_id),
        )?;
        Ok(names)
    }

    pub fn for_transaction_rows(
        conn: &mut PgConnection,
        rows: &[DbTransactionData],
    ) -> QueryResult<Self> {
        let mut names = Self::default();
        names.load_kind(
            conn,
            MasterKind::InstrumentType,
            &distinct_ids(rows, |r| r.instrument_type_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::TransactionType,
            &distinct_ids(rows, |r| r.transaction_type_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::GeographicalLocation,
            &distinct_ids(rows, |r| r.geographical_location_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::ChannelUsed,
            &distinct_ids(rows, |r| r.channel_used_id),
        )?;
        Ok(names)
    }

    pub fn for_total_transactions(
        conn: &mut PgConnection,
        rows: &[DbTotalTransaction],
    ) -> QueryResult<Self> {
        let mut names = Self::default();
        names.load_kind(
            conn,
            MasterKind::TransactionRange,
            &distinct_ids(rows, |r| r.transaction_range_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::TransactionType,
            &distinct_ids(rows, |r| r.transaction_type_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::InstrumentType,
            &distinct_ids(rows, |r| r.instrument_type_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::GeographicalLocation,
            &distinct_ids(rows, |r| r.geographical_location_id),
        )?;
        names.load_kind(
            conn,
            MasterKind::ChannelUsed,
            &distinct_ids(rows, |r| r.channel_used_id),
        )?;
        Ok(names)
    }

    /// Loads the names of `ids` from the `kind` table.
    pub fn load_kind(
        &mut self,
        conn: &mut PgConnection,
        kind: MasterKind,
        ids: &[i32],
    ) -> QueryResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let entries = with_master_table!(kind, |t| {
            t::table
                .filter(t::id.eq_any(ids.to_vec()))
                .select((t::id, t::name))
                .load::<DbMaster>(conn)
        })?;
        for entry in entries {
            self.insert(kind, entry.id, &entry.name);
        }
        Ok(())
    }

    pub fn load_branches(&mut self, conn: &mut PgConnection, ids: &[i32]) -> QueryResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let rows: Vec<DbBranch> = branches::table
            .filter(branches::id.eq_any(ids.to_vec()))
            .select(DbBranch::as_select())
            .load(conn)?;
        for branch in rows {
            self.insert_branch(branch);
        }
        Ok(())
    }

    pub fn insert(&mut self, kind: MasterKind, id: i32, name: &str) {
        self.names
            .entry(kind)
            .or_default()
            .insert(id, name.to_string());
    }

    pub fn insert_branch(&mut self, branch: DbBranch) {
        self.branches.insert(branch.id, branch);
    }

    pub fn name(&self, kind: MasterKind, id: i32) -> String {
        self.names
            .get(&kind)
            .and_then(|m| m.get(&id))
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn branch(&self, id: i32) -> (String, String) {
        match self.branches.get(&id) {
            Some(b) => (b.code.clone(), b.name.clone()),
            None => (format!("#{id}"), String::new()),
        }
    }
}

pub fn db_customer_data_to_view(db: DbCustomerData, names: &MasterNames) -> CustomerDataView {
    let (branch_code, branch_name) = names.branch(db.branch_id);
    CustomerDataView {
        id: db.id,
        month_year: db.month_year,
        branch_code,
        branch_name,
        customer_category: names.name(MasterKind::CustomerCategory, db.customer_category_id),
        service_type: names.name(MasterKind::ServiceType, db.service_type_id),
        status: db.status,
        number_of_customers: db.number_of_customers,
    }
}

pub fn db_transaction_data_to_view(
    db: DbTransactionData,
    names: &MasterNames,
) -> TransactionDataView {
    TransactionDataView {
        id: db.id,
        month_year: db.month_year,
        range_of_transactions: db.range_of_transactions,
        instrument_type: names.name(MasterKind::InstrumentType, db.instrument_type_id),
        transaction_type: names.name(MasterKind::TransactionType, db.transaction_type_id),
        geographical_location: names.name(
            MasterKind::GeographicalLocation,
            db.geographical_location_id,
        ),
        channel_used: names.name(MasterKind::ChannelUsed, db.channel_used_id),
        number_of_transactions: db.number_of_transactions,
        amount: db.amount,
    }
}

pub fn db_total_user_to_view(db: DbTotalUser, names: &MasterNames) -> TotalUserView {
    TotalUserView {
        id: db.id,
        fiscal_year: db.fiscal_year,
        month_year: db.month_year,
        service_type: names.name(MasterKind::ServiceType, db.service_type_id),
        status: db.status,
        count: db.count,
    }
}

pub fn db_total_transaction_to_view(
    db: DbTotalTransaction,
    names: &MasterNames,
) -> TotalTransactionView {
    TotalTransactionView {
        id: db.id,
        fiscal_year: db.fiscal_year,
        month_year: db.month_year,
        transaction_range: names.name(MasterKind::TransactionRange, db.transaction_range_id),
        transaction_type: names.name(MasterKind::TransactionType, db.transaction_type_id),
        instrument_type: names.name(MasterKind::InstrumentType, db.instrument_type_id),
        geographical_location: names.name(
            MasterKind::GeographicalLocation,
            db.geographical_location_id,
        ),
        channel_used: names.name(MasterKind::ChannelUsed, db.channel_used_id),
        number_of_transactions: db.number_of_transactions,
        amount: db.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn names() -> MasterNames {
        let mut names = MasterNames::default();
        names.insert_branch(DbBranch {
            id: 1,
            code: "001".to_string(),
            name: "Head Office".to_string(),
        });
        names.insert(MasterKind::CustomerCategory, 2, "Retail");
        names.insert(MasterKind::ServiceType, 3, "Mobile Banking");
        names
    }

    #[test]
    fn test_customer_view_resolves_names() {
        let now = Utc::now();
        let view = db_customer_data_to_view(
            DbCustomerData {
                id: 10,
                branch_id: 1,
                customer_category_id: 2,
                service_type_id: 3,
                status: CustomerStatus::Active,
                number_of_customers: 150,
                month_year: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                created_at: now,
                updated_at: now,
            },
            &names(),
        );
        assert_eq!(view.branch_code, "001");
        assert_eq!(view.branch_name, "Head Office");
        assert_eq!(view.customer_category, "Retail");
        assert_eq!(view.service_type, "Mobile Banking");
    }

    #[test]
    fn test_distinct_ids_are_sorted_and_deduplicated() {
        let rows = [(1, 7), (2, 3), (3, 7), (4, 1)];
        assert_eq!(distinct_ids(&rows, |r| r.1), vec![1, 3, 7]);
        assert!(distinct_ids(&[] as &[(i32, i32)], |r| r.1).is_empty());
    }

    #[test]
    fn test_unknown_ids_render_as_placeholders() {
        let now = Utc::now();
        let view = db_total_transaction_to_view(
            DbTotalTransaction {
                id: 1,
                fiscal_year: "2081/82".to_string(),
                month_year: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                transaction_range_id: 9,
                transaction_type_id: 9,
                instrument_type_id: 9,
                geographical_location_id: 9,
                channel_used_id: 9,
                number_of_transactions: 1,
                amount: BigDecimal::from_str("1.50").unwrap(),
                created_at: now,
                updated_at: now,
            },
            &names(),
        );
        assert_eq!(view.transaction_range, "#9");
        assert_eq!(view.channel_used, "#9");
    }
}

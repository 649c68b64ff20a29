use bigdecimal::{BigDecimal, Signed, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::{parse_month, CustomerStatus};

use super::error::StatisticsError;
use super::pagination::Page;
use super::storage::{DbBranch, DbDataUploadLog, DbMaster, NewTotalTransaction, NewTotalUser};

/// Name-only master tables. Branches carry a code as well and are handled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterKind {
    CustomerCategory,
    ServiceType,
    TransactionRange,
    TransactionType,
    InstrumentType,
    GeographicalLocation,
    ChannelUsed,
}

impl MasterKind {
    pub const ALL: [MasterKind; 7] = [
        Self::CustomerCategory,
        Self::ServiceType,
        Self::TransactionRange,
        Self::TransactionType,
        Self::InstrumentType,
        Self::GeographicalLocation,
        Self::ChannelUsed,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::CustomerCategory => "customer_category",
            Self::ServiceType => "service_type",
            Self::TransactionRange => "transaction_range",
            Self::TransactionType => "transaction_type",
            Self::InstrumentType => "instrument_type",
            Self::GeographicalLocation => "geographical_location",
            Self::ChannelUsed => "channel_used",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomerCategory => "Customer Categories",
            Self::ServiceType => "Service Types",
            Self::TransactionRange => "Transaction Ranges",
            Self::TransactionType => "Transaction Types",
            Self::InstrumentType => "Instrument Types",
            Self::GeographicalLocation => "Geographical Locations",
            Self::ChannelUsed => "Channels Used",
        }
    }
}

impl std::fmt::Display for MasterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for MasterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("Unknown master parameter: {s}"))
    }
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDataView {
    pub id: i64,
    pub month_year: NaiveDate,
    pub branch_code: String,
    pub branch_name: String,
    pub customer_category: String,
    pub service_type: String,
    pub status: CustomerStatus,
    pub number_of_customers: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDataView {
    pub id: i64,
    pub month_year: NaiveDate,
    pub range_of_transactions: String,
    pub instrument_type: String,
    pub transaction_type: String,
    pub geographical_location: String,
    pub channel_used: String,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalUserView {
    pub id: i64,
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub service_type: String,
    pub status: CustomerStatus,
    pub count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalTransactionView {
    pub id: i64,
    pub fiscal_year: String,
    pub month_year: NaiveDate,
    pub transaction_range: String,
    pub transaction_type: String,
    pub instrument_type: String,
    pub geographical_location: String,
    pub channel_used: String,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
}

/// Active/inactive rollup totals for one service type in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummaryRow {
    pub month_year: NaiveDate,
    pub service_type: String,
    pub active_count: i64,
    pub inactive_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTotals {
    pub total_transactions: i64,
    pub total_amount: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub total_branches: i64,
    pub total_customer_records: i64,
    pub total_transaction_records: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub counts: DashboardCounts,
    pub recent_uploads: Vec<DbDataUploadLog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterGroup {
    pub kind: MasterKind,
    pub entries: Vec<DbMaster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterListing {
    pub branches: Vec<DbBranch>,
    pub groups: Vec<MasterGroup>,
}

/// Dropdown options for the rollup summary filters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    pub transaction_ranges: Vec<DbMaster>,
    pub transaction_types: Vec<DbMaster>,
    pub instrument_types: Vec<DbMaster>,
    pub geographical_locations: Vec<DbMaster>,
    pub channels_used: Vec<DbMaster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalUserList {
    pub page: Page<TotalUserView>,
    pub status: Option<CustomerStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalTransactionList {
    pub page: Page<TotalTransactionView>,
    pub transaction_types: Vec<DbMaster>,
    pub transaction_type_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub page: Page<UserSummaryRow>,
    pub filter: UserSummaryFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub page: Page<TotalTransactionView>,
    pub totals: TransactionTotals,
    pub options: FilterOptions,
    pub filter: TransactionSummaryFilter,
}

/// Result of the master get-or-create endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MasterRecord {
    Branch(DbBranch),
    Named(DbMaster),
}

// ============================================================================
// Query strings
// ============================================================================

/// Values are kept as raw strings so malformed input is ignored instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataTablesQuery {
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataTable {
    Customer,
    Transaction,
}

impl DataTablesQuery {
    /// Anything other than `customer` (the default) selects the transaction table.
    pub fn table(&self) -> DataTable {
        match non_empty(&self.data_type) {
            None | Some("customer") => DataTable::Customer,
            Some(_) => DataTable::Transaction,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalUserListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
}

impl TotalUserListQuery {
    pub fn status(&self) -> Option<CustomerStatus> {
        non_empty(&self.status).and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalTransactionListQuery {
    pub transaction_type: Option<String>,
    pub page: Option<String>,
}

impl TotalTransactionListQuery {
    pub fn transaction_type_id(&self) -> Option<i32> {
        parse_i32(&self.transaction_type)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSummaryQuery {
    pub fiscal_year: Option<String>,
    pub month_year: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserSummaryFilter {
    pub fiscal_year: Option<String>,
    pub month: Option<NaiveDate>,
}

impl UserSummaryQuery {
    pub fn filter(&self) -> UserSummaryFilter {
        UserSummaryFilter {
            fiscal_year: non_empty(&self.fiscal_year).map(str::to_string),
            month: non_empty(&self.month_year).and_then(parse_month),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionSummaryQuery {
    pub transaction_range: Option<String>,
    pub type_of_transaction: Option<String>,
    pub form_of_instrument: Option<String>,
    pub geographical_location: Option<String>,
    pub channel_used: Option<String>,
    pub min_transactions: Option<String>,
    pub max_transactions: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionSummaryFilter {
    pub transaction_range_id: Option<i32>,
    pub transaction_type_id: Option<i32>,
    pub instrument_type_id: Option<i32>,
    pub geographical_location_id: Option<i32>,
    pub channel_used_id: Option<i32>,
    pub min_transactions: Option<i32>,
    pub max_transactions: Option<i32>,
}

impl TransactionSummaryQuery {
    pub fn filter(&self) -> TransactionSummaryFilter {
        TransactionSummaryFilter {
            transaction_range_id: parse_i32(&self.transaction_range),
            transaction_type_id: parse_i32(&self.type_of_transaction),
            instrument_type_id: parse_i32(&self.form_of_instrument),
            geographical_location_id: parse_i32(&self.geographical_location),
            channel_used_id: parse_i32(&self.channel_used),
            min_transactions: parse_i32(&self.min_transactions),
            max_transactions: parse_i32(&self.max_transactions),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_i32(value: &Option<String>) -> Option<i32> {
    non_empty(value).and_then(|v| v.parse().ok())
}

// ============================================================================
// Admin requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasterRequest {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTotalUserRequest {
    pub fiscal_year: String,
    /// `YYYY-MM`
    pub month_year: String,
    pub service_type_id: i32,
    pub status: String,
    pub count: i32,
}

impl CreateTotalUserRequest {
    pub fn validate(&self) -> Result<NewTotalUser, StatisticsError> {
        Ok(NewTotalUser {
            fiscal_year: validate_fiscal_year(&self.fiscal_year)?,
            month_year: validate_month(&self.month_year)?,
            service_type_id: self.service_type_id,
            status: self
                .status
                .parse()
                .map_err(|e: String| StatisticsError::Validation(e))?,
            count: validate_non_negative("count", self.count)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTotalTransactionRequest {
    pub fiscal_year: String,
    /// `YYYY-MM`
    pub month_year: String,
    pub transaction_range_id: i32,
    pub transaction_type_id: i32,
    pub instrument_type_id: i32,
    pub geographical_location_id: i32,
    pub channel_used_id: i32,
    pub number_of_transactions: i32,
    pub amount: BigDecimal,
}

impl CreateTotalTransactionRequest {
    pub fn validate(&self) -> Result<NewTotalTransaction, StatisticsError> {
        let amount = normalize_amount(&self.amount)
            .map_err(|reason| StatisticsError::Validation(format!("amount {reason}")))?;
        Ok(NewTotalTransaction {
            fiscal_year: validate_fiscal_year(&self.fiscal_year)?,
            month_year: validate_month(&self.month_year)?,
            transaction_range_id: self.transaction_range_id,
            transaction_type_id: self.transaction_type_id,
            instrument_type_id: self.instrument_type_id,
            geographical_location_id: self.geographical_location_id,
            channel_used_id: self.channel_used_id,
            number_of_transactions: validate_non_negative(
                "number_of_transactions",
                self.number_of_transactions,
            )?,
            amount,
        })
    }
}

/// NUMERIC(15, 2) leaves 13 digits before the decimal point.
pub const MAX_AMOUNT_INTEGER_DIGITS: i64 = 13;

/// Rounds `amount` to cents when it fits NUMERIC(15, 2).
///
/// The magnitude is judged from the digit count and scale alone, so inputs such as
/// `1e999999999` are rejected without being expanded.
pub fn normalize_amount(amount: &BigDecimal) -> Result<BigDecimal, &'static str> {
    if amount.is_negative() {
        return Err("must not be negative");
    }
    if amount.is_zero() {
        return Ok(BigDecimal::zero().with_scale(2));
    }
    let integer_digits = amount.digits() as i64 - amount.fractional_digit_count();
    if integer_digits > MAX_AMOUNT_INTEGER_DIGITS {
        return Err(AMOUNT_TOO_LARGE);
    }
    // Smaller than a thousandth: rounds to zero.
    if integer_digits < -2 {
        return Ok(BigDecimal::zero().with_scale(2));
    }
    let rounded = amount.round(2);
    if rounded.digits() as i64 - rounded.fractional_digit_count() > MAX_AMOUNT_INTEGER_DIGITS {
        return Err(AMOUNT_TOO_LARGE);
    }
    Ok(rounded)
}

const AMOUNT_TOO_LARGE: &str = "exceeds 15 digits with 2 decimal places";

fn validate_fiscal_year(value: &str) -> Result<String, StatisticsError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 10 {
        return Err(StatisticsError::Validation(
            "fiscal_year must be 1 to 10 characters".to_string(),
        ));
    }
    Ok(value.to_string())
}

fn validate_month(value: &str) -> Result<NaiveDate, StatisticsError> {
    parse_month(value).ok_or_else(|| {
        StatisticsError::Validation("Invalid date format. Use YYYY-MM.".to_string())
    })
}

fn validate_non_negative(field: &str, value: i32) -> Result<i32, StatisticsError> {
    if value < 0 {
        return Err(StatisticsError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_master_kind_slugs_roundtrip() {
        for kind in MasterKind::ALL {
            assert_eq!(MasterKind::from_str(kind.slug()), Ok(kind));
        }
        assert!(MasterKind::from_str("branch").is_err());
    }

    #[test]
    fn test_transaction_filter_ignores_malformed_values() {
        let query = TransactionSummaryQuery {
            transaction_range: Some("3".to_string()),
            type_of_transaction: Some("".to_string()),
            form_of_instrument: Some("abc".to_string()),
            min_transactions: Some(" 10 ".to_string()),
            max_transactions: Some("lots".to_string()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.transaction_range_id, Some(3));
        assert_eq!(filter.transaction_type_id, None);
        assert_eq!(filter.instrument_type_id, None);
        assert_eq!(filter.min_transactions, Some(10));
        assert_eq!(filter.max_transactions, None);
    }

    #[test]
    fn test_user_summary_filter_drops_bad_month() {
        let query = UserSummaryQuery {
            fiscal_year: Some("2081/82".to_string()),
            month_year: Some("July".to_string()),
            page: None,
        };
        let filter = query.filter();
        assert_eq!(filter.fiscal_year.as_deref(), Some("2081/82"));
        assert_eq!(filter.month, None);
    }

    #[test]
    fn test_data_table_selection() {
        let mut query = DataTablesQuery::default();
        assert_eq!(query.table(), DataTable::Customer);
        query.data_type = Some("transaction".to_string());
        assert_eq!(query.table(), DataTable::Transaction);
    }

    #[test]
    fn test_total_user_request_rejects_negative_count() {
        let request = CreateTotalUserRequest {
            fiscal_year: "2081/82".to_string(),
            month_year: "2025-01".to_string(),
            service_type_id: 1,
            status: "active".to_string(),
            count: -5,
        };
        assert!(matches!(
            request.validate(),
            Err(StatisticsError::Validation(_))
        ));
    }

    #[test]
    fn test_total_transaction_request_rejects_negative_amount() {
        let request = CreateTotalTransactionRequest {
            fiscal_year: "2081/82".to_string(),
            month_year: "2025-01".to_string(),
            transaction_range_id: 1,
            transaction_type_id: 1,
            instrument_type_id: 1,
            geographical_location_id: 1,
            channel_used_id: 1,
            number_of_transactions: 3,
            amount: BigDecimal::from_str("-0.01").unwrap(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_amount_with_huge_exponent_is_rejected_without_expanding() {
        let huge = BigDecimal::from_str("1e999999999").unwrap();
        assert_eq!(normalize_amount(&huge), Err(AMOUNT_TOO_LARGE));

        let request = CreateTotalTransactionRequest {
            fiscal_year: "2081/82".to_string(),
            month_year: "2025-01".to_string(),
            transaction_range_id: 1,
            transaction_type_id: 1,
            instrument_type_id: 1,
            geographical_location_id: 1,
            channel_used_id: 1,
            number_of_transactions: 3,
            amount: huge,
        };
        assert!(matches!(
            request.validate(),
            Err(StatisticsError::Validation(_))
        ));
    }

    #[test]
    fn test_amount_bounds() {
        let amount = |s: &str| normalize_amount(&BigDecimal::from_str(s).unwrap());
        assert_eq!(
            amount("9999999999999.99"),
            Ok(BigDecimal::from_str("9999999999999.99").unwrap())
        );
        assert_eq!(amount("10000000000000"), Err(AMOUNT_TOO_LARGE));
        assert_eq!(amount("9999999999999.995"), Err(AMOUNT_TOO_LARGE));
        assert_eq!(amount("12.346"), Ok(BigDecimal::from_str("12.35").unwrap()));
        assert_eq!(amount("5e3"), Ok(BigDecimal::from_str("5000.00").unwrap()));
        assert_eq!(amount("1e-999999999"), Ok(BigDecimal::from(0)));
        assert_eq!(amount("-0.01"), Err("must not be negative"));
    }
}

//! CSV upload processing.
//!
//! A file is decoded, checked for its required columns and fully parsed before anything is
//! written. Writes then happen inside a single [`StatisticsStore::atomically`] call so a
//! failing row leaves no trace of the file except its audit log entry.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use std::collections::HashMap;
use std::str::FromStr;

use crate::shared::{CustomerStatus, DataType, UploadStatus};

use super::error::IngestError;
use super::storage::{NewCustomerData, NewDataUploadLog, NewTransactionData};
use super::store::StatisticsStore;
use super::types::{normalize_amount, MasterKind};

pub const CUSTOMER_COLUMNS: [&str; 6] = [
    "Branch code",
    "Branch name",
    "Categorization of customers",
    "Mobile Banking",
    "Status",
    "Number of customers",
];

pub const TRANSACTION_COLUMNS: [&str; 7] = [
    "Form of instrument",
    "Type of transaction",
    "Geographical location",
    "Channel used",
    "Range of transactions",
    "Number of transactions",
    "Amount",
];

/// Length of `data_upload_logs.file_name`.
pub const MAX_FILE_NAME_CHARS: usize = 255;

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data_type: DataType,
    pub month: NaiveDate,
    pub file_name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub status: UploadStatus,
    pub records_uploaded: usize,
    pub error_message: Option<String>,
}

impl UploadOutcome {
    /// Text shown to the uploader.
    pub fn message(&self) -> String {
        match self.status {
            UploadStatus::Success => {
                format!("Successfully uploaded {} records.", self.records_uploaded)
            }
            _ => format!(
                "Upload failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Ingests one file and records the attempt in the upload log.
///
/// Ingestion failures are reported through the returned outcome; only a failure to write
/// the log entry itself is returned as an error.
pub fn process_upload(
    store: &mut dyn StatisticsStore,
    request: &UploadRequest,
) -> Result<UploadOutcome, IngestError> {
    let outcome = match ingest_file(store, request) {
        Ok(records) => {
            info!(
                "[UPLOAD] {} '{}' for {}: {} records",
                request.data_type,
                request.file_name,
                request.month.format("%Y-%m"),
                records
            );
            UploadOutcome {
                status: UploadStatus::Success,
                records_uploaded: records,
                error_message: None,
            }
        }
        Err(e) => {
            warn!(
                "[UPLOAD] {} '{}' for {} failed: {}",
                request.data_type,
                request.file_name,
                request.month.format("%Y-%m"),
                e
            );
            UploadOutcome {
                status: UploadStatus::Failed,
                records_uploaded: 0,
                error_message: Some(e.to_string()),
            }
        }
    };

    store.record_upload(&NewDataUploadLog {
        month_year: request.month,
        data_type: request.data_type,
        file_name: request.file_name.chars().take(MAX_FILE_NAME_CHARS).collect(),
        records_uploaded: i32::try_from(outcome.records_uploaded).unwrap_or(i32::MAX),
        status: outcome.status,
        error_message: outcome.error_message.clone(),
    })?;

    Ok(outcome)
}

/// Parses and writes the file, returning the number of rows written.
pub fn ingest_file(
    store: &mut dyn StatisticsStore,
    request: &UploadRequest,
) -> Result<usize, IngestError> {
    let text = decode(&request.contents)?;
    match request.data_type {
        DataType::Customer => {
            let rows = parse_customer_rows(text)?;
            write_customer_rows(store, request.month, &rows)
        }
        DataType::Transaction => {
            let rows = parse_transaction_rows(text)?;
            write_transaction_rows(store, request.month, &rows)
        }
    }
}

fn decode(contents: &[u8]) -> Result<&str, IngestError> {
    let text = std::str::from_utf8(contents).map_err(|_| IngestError::Encoding)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct CustomerRow {
    branch_code: String,
    branch_name: String,
    category: String,
    service_type: String,
    status: CustomerStatus,
    number_of_customers: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct TransactionRow {
    instrument_type: String,
    transaction_type: String,
    geographical_location: String,
    channel_used: String,
    range_of_transactions: String,
    number_of_transactions: i32,
    amount: BigDecimal,
}

/// Positions of the required columns within the header row.
struct Columns(HashMap<&'static str, usize>);

impl Columns {
    fn locate(headers: &StringRecord, required: &[&'static str]) -> Result<Self, IngestError> {
        let mut positions = HashMap::new();
        let mut missing = Vec::new();
        for column in required {
            match headers.iter().position(|h| h == *column) {
                Some(idx) => {
                    positions.insert(*column, idx);
                }
                None => missing.push(column.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }
        Ok(Self(positions))
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.0
            .get(column)
            .and_then(|idx| record.get(*idx))
            .unwrap_or("")
    }
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

fn parse_customer_rows(text: &str) -> Result<Vec<CustomerRow>, IngestError> {
    let mut reader = reader(text);
    let columns = Columns::locate(reader.headers()?, &CUSTOMER_COLUMNS)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let status_raw = columns.get(&record, "Status");
        let status = CustomerStatus::from_str(status_raw).map_err(|_| {
            IngestError::invalid(row, "Status", status_raw, "expected ACTIVE or INACTIVE")
        })?;
        rows.push(CustomerRow {
            branch_code: required_name(row, "Branch code", columns.get(&record, "Branch code"))?,
            branch_name: columns.get(&record, "Branch name").to_string(),
            category: required_name(
                row,
                "Categorization of customers",
                columns.get(&record, "Categorization of customers"),
            )?,
            service_type: required_name(
                row,
                "Mobile Banking",
                columns.get(&record, "Mobile Banking"),
            )?,
            status,
            number_of_customers: parse_count(
                row,
                "Number of customers",
                columns.get(&record, "Number of customers"),
            )?,
        });
    }
    Ok(rows)
}

fn parse_transaction_rows(text: &str) -> Result<Vec<TransactionRow>, IngestError> {
    let mut reader = reader(text);
    let columns = Columns::locate(reader.headers()?, &TRANSACTION_COLUMNS)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let name = |column: &str| required_name(row, column, columns.get(&record, column));
        rows.push(TransactionRow {
            instrument_type: name("Form of instrument")?,
            transaction_type: name("Type of transaction")?,
            geographical_location: name("Geographical location")?,
            channel_used: name("Channel used")?,
            range_of_transactions: name("Range of transactions")?,
            number_of_transactions: parse_count(
                row,
                "Number of transactions",
                columns.get(&record, "Number of transactions"),
            )?,
            amount: parse_amount(row, "Amount", columns.get(&record, "Amount"))?,
        });
    }
    Ok(rows)
}

fn required_name(row: usize, column: &str, value: &str) -> Result<String, IngestError> {
    if value.is_empty() {
        return Err(IngestError::invalid(row, column, value, "must not be empty"));
    }
    Ok(value.to_string())
}

fn parse_count(row: usize, column: &str, value: &str) -> Result<i32, IngestError> {
    match value.parse::<i32>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(IngestError::invalid(
            row,
            column,
            value,
            "expected a non-negative whole number",
        )),
    }
}

fn parse_amount(row: usize, column: &str, value: &str) -> Result<BigDecimal, IngestError> {
    let amount = BigDecimal::from_str(value)
        .map_err(|_| IngestError::invalid(row, column, value, "expected a decimal number"))?;
    normalize_amount(&amount).map_err(|reason| IngestError::invalid(row, column, value, reason))
}

// ============================================================================
// Writing
// ============================================================================

fn write_customer_rows(
    store: &mut dyn StatisticsStore,
    month: NaiveDate,
    rows: &[CustomerRow],
) -> Result<usize, IngestError> {
    store.atomically(&mut |tx| {
        for row in rows {
            let record = NewCustomerData {
                branch_id: tx.branch_id(&row.branch_code, &row.branch_name)?,
                customer_category_id: tx.master_id(MasterKind::CustomerCategory, &row.category)?,
                service_type_id: tx.master_id(MasterKind::ServiceType, &row.service_type)?,
                status: row.status,
                number_of_customers: row.number_of_customers,
                month_year: month,
            };
            tx.upsert_customer_data(&record)?;
        }
        Ok(rows.len())
    })
}

fn write_transaction_rows(
    store: &mut dyn StatisticsStore,
    month: NaiveDate,
    rows: &[TransactionRow],
) -> Result<usize, IngestError> {
    store.atomically(&mut |tx| {
        for row in rows {
            let record = NewTransactionData {
                month_year: month,
                range_of_transactions: row.range_of_transactions.clone(),
                instrument_type_id: tx.master_id(MasterKind::InstrumentType, &row.instrument_type)?,
                transaction_type_id: tx
                    .master_id(MasterKind::TransactionType, &row.transaction_type)?,
                geographical_location_id: tx
                    .master_id(MasterKind::GeographicalLocation, &row.geographical_location)?,
                channel_used_id: tx.master_id(MasterKind::ChannelUsed, &row.channel_used)?,
                number_of_transactions: row.number_of_transactions,
                amount: row.amount.clone(),
            };
            tx.upsert_transaction_data(&record)?;
        }
        Ok(rows.len())
    })
}

//! Status and type codes stored as upper-case text columns.
//!
//! The database keeps the codes readable (`ACTIVE`, `SUCCESS`, ...) and guards them
//! with CHECK constraints; these enums give the Rust side the same closed set.

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;

macro_rules! text_code_sql {
    ($ty:ident) => {
        impl ToSql<Text, Pg> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(serialize::IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $ty {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                value.parse().map_err(Into::into)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// CUSTOMER STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(format!("Unknown customer status: {s}")),
        }
    }
}

text_code_sql!(CustomerStatus);

// ============================================================================
// DATA TYPE
// ============================================================================

/// Kind of file accepted by the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Customer,
    Transaction,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Transaction => "TRANSACTION",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Customer => "Customer Data",
            Self::Transaction => "Transaction Data",
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "TRANSACTION" => Ok(Self::Transaction),
            _ => Err(format!("Unknown data type: {s}")),
        }
    }
}

text_code_sql!(DataType);

// ============================================================================
// UPLOAD STATUS
// ============================================================================

/// Outcome recorded in the upload audit log.
///
/// `Partial` is part of the stored vocabulary but ingestion is all-or-nothing, so it is
/// never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    Success,
    Failed,
    Partial,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Partial => "PARTIAL",
        }
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "PARTIAL" => Ok(Self::Partial),
            _ => Err(format!("Unknown upload status: {s}")),
        }
    }
}

text_code_sql!(UploadStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_status_is_case_insensitive() {
        assert_eq!("active".parse::<CustomerStatus>(), Ok(CustomerStatus::Active));
        assert_eq!(" Inactive ".parse::<CustomerStatus>(), Ok(CustomerStatus::Inactive));
        assert!("dormant".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn test_data_type_codes() {
        assert_eq!("CUSTOMER".parse::<DataType>(), Ok(DataType::Customer));
        assert_eq!(DataType::Transaction.to_string(), "TRANSACTION");
        assert!("customer".parse::<DataType>().is_err());
    }

    #[test]
    fn test_upload_status_roundtrip_codes() {
        for status in [UploadStatus::Success, UploadStatus::Failed, UploadStatus::Partial] {
            assert_eq!(status.as_str().parse::<UploadStatus>(), Ok(status));
        }
    }
}

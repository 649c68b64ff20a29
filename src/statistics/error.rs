use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for StatisticsError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl IntoResponse for StatisticsError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(msg) | Self::Internal(msg) => {
                log::error!("[STATS] {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Failure while turning one uploaded file into fact rows.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("file is not valid UTF-8 text")]
    Encoding,
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: invalid {column} '{value}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
    #[error("database error: {0}")]
    Database(String),
}

impl From<diesel::result::Error> for IngestError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl IngestError {
    pub fn invalid(row: usize, column: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

use axum::{
    extract::{Multipart, State},
    response::{Html, Redirect},
    Extension,
};
use log::{error, warn};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::shared::state::AppState;
use crate::shared::{parse_month, DataType, UploadStatus};
use crate::statistics::error::StatisticsError;
use crate::statistics::ingest::{process_upload, UploadRequest};
use crate::statistics::store::PgStore;
use crate::statistics::ui::render_upload_form;
use crate::web::auth::AuthenticatedUser;
use crate::web::flash::{set_flash, Flash};

use super::{page_context, run_blocking};

const UPLOAD_PAGE: &str = "/data-upload";

pub async fn handle_upload_page(
    Extension(user): Extension<AuthenticatedUser>,
    cookies: Cookies,
) -> Html<String> {
    Html(render_upload_form(&page_context(&user, &cookies)))
}

/// Raw multipart fields of the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    data_type: Option<String>,
    month_year: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "data_type" => form.data_type = Some(field.text().await.map_err(|e| e.to_string())?),
                "month_year" => {
                    form.month_year = Some(field.text().await.map_err(|e| e.to_string())?)
                }
                "data_file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                    if !file_name.is_empty() {
                        form.file = Some((file_name, bytes.to_vec()));
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Checks presence first, then the month format, then the data type.
    fn validate(self) -> Result<UploadRequest, &'static str> {
        let data_type = self.data_type.filter(|v| !v.trim().is_empty());
        let month_year = self.month_year.filter(|v| !v.trim().is_empty());
        let (Some(data_type), Some(month_year), Some((file_name, contents))) =
            (data_type, month_year, self.file)
        else {
            return Err("All fields are required.");
        };
        let month = parse_month(&month_year).ok_or("Invalid date format. Use YYYY-MM.")?;
        let data_type: DataType = data_type
            .trim()
            .parse()
            .map_err(|_| "Invalid data type.")?;
        Ok(UploadRequest {
            data_type,
            month,
            file_name,
            contents,
        })
    }
}

pub async fn handle_upload_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    multipart: Multipart,
) -> Redirect {
    let form = match UploadForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!("[UPLOAD] Unreadable upload form: {}", e);
            set_flash(&cookies, Flash::error(format!("Upload failed: {e}")));
            return Redirect::to(UPLOAD_PAGE);
        }
    };

    let request = match form.validate() {
        Ok(request) => request,
        Err(message) => {
            set_flash(&cookies, Flash::error(message));
            return Redirect::to(UPLOAD_PAGE);
        }
    };

    let result = run_blocking(&state, move |conn| {
        let mut store = PgStore::new(conn);
        process_upload(&mut store, &request).map_err(|e| StatisticsError::Database(e.to_string()))
    })
    .await;

    match result {
        Ok(outcome) if outcome.status == UploadStatus::Success => {
            set_flash(&cookies, Flash::success(outcome.message()));
        }
        Ok(outcome) => set_flash(&cookies, Flash::error(outcome.message())),
        Err(e) => {
            error!("[UPLOAD] Upload could not be recorded: {}", e);
            set_flash(&cookies, Flash::error(format!("Upload failed: {e}")));
        }
    }
    Redirect::to(UPLOAD_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(data_type: &str, month: &str, file: Option<&str>) -> UploadForm {
        UploadForm {
            data_type: Some(data_type.to_string()),
            month_year: Some(month.to_string()),
            file: file.map(|name| (name.to_string(), b"a,b\n".to_vec())),
        }
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            form("CUSTOMER", "2025-01", None).validate().unwrap_err(),
            "All fields are required."
        );
        assert_eq!(
            form("", "2025-01", Some("a.csv")).validate().unwrap_err(),
            "All fields are required."
        );
    }

    #[test]
    fn test_bad_month_is_reported_before_bad_type() {
        assert_eq!(
            form("BOGUS", "01/2025", Some("a.csv")).validate().unwrap_err(),
            "Invalid date format. Use YYYY-MM."
        );
        assert_eq!(
            form("BOGUS", "2025-01", Some("a.csv")).validate().unwrap_err(),
            "Invalid data type."
        );
    }

    #[test]
    fn test_valid_form() {
        let request = form("TRANSACTION", "2025-03", Some("march.csv"))
            .validate()
            .unwrap();
        assert_eq!(request.data_type, DataType::Transaction);
        assert_eq!(request.file_name, "march.csv");
        assert_eq!(request.month.to_string(), "2025-03-01");
    }
}

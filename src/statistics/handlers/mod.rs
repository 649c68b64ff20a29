pub mod api;
pub mod home;
pub mod tables;
pub mod totals;
pub mod upload;

pub use api::*;
pub use home::*;
pub use tables::*;
pub use totals::*;
pub use upload::*;

use diesel::PgConnection;
use tower_cookies::Cookies;

use crate::shared::state::AppState;
use crate::statistics::error::StatisticsError;
use crate::statistics::ui::PageContext;
use crate::web::auth::AuthenticatedUser;
use crate::web::flash::take_flash;

/// Runs `work` on the blocking pool with a pooled connection.
pub(crate) async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, StatisticsError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, StatisticsError> + Send + 'static,
{
    let pool = state.conn.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| StatisticsError::Database(e.to_string()))?;
        work(&mut conn)
    })
    .await
    .map_err(|e| StatisticsError::Internal(format!("Task join error: {e}")))?
}

pub(crate) fn page_context(user: &AuthenticatedUser, cookies: &Cookies) -> PageContext {
    PageContext {
        username: Some(user.username.clone()),
        flash: take_flash(cookies),
    }
}

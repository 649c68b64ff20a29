pub mod enums;
pub mod models;
pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use enums::*;
pub use schema::*;

pub use utils::{create_conn, month_label, next_month, parse_month, DbPool};

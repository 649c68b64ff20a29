use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use diesel::{
    r2d2::{ConnectionManager, Pool},
    Connection, PgConnection,
};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(
    database_url: &str,
    max_connections: u32,
) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_connections).build(manager)
}

pub fn establish_pg_connection(database_url: &str) -> Result<PgConnection> {
    PgConnection::establish(database_url)
        .with_context(|| format!("Failed to connect to database at {}", redact_url(database_url)))
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get().context("Failed to get connection for migrations")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}

/// Parses a `YYYY-MM` month into the first day of that month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// First day of the month following `month`.
pub fn next_month(month: NaiveDate) -> NaiveDate {
    let (year, next) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, next, 1).unwrap_or(month)
}

/// Label used on chart axes, e.g. `Jan 2025`.
pub fn month_label(month: NaiveDate) -> String {
    month.format("%b %Y").to_string()
}

/// Drops the password from a connection URL before it reaches the logs.
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-03"), NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(parse_month(" 2024-12 "), NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(parse_month("2025-13"), None);
        assert_eq!(parse_month("2025/03"), None);
        assert_eq!(parse_month("03-2025"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn test_next_month_wraps_year() {
        let dec = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(next_month(dec), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let jun = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(next_month(jun), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn test_month_label() {
        let month = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(month_label(month), "Jan 2025");
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("postgres://stats:secret@db:5432/stats"),
            "postgres://stats:***@db:5432/stats"
        );
        assert_eq!(redact_url("postgres://db/stats"), "postgres://db/stats");
    }
}

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use bankstats::core::config::AppConfig;
use bankstats::main_module::run_server;
use bankstats::shared::models::upsert_user;
use bankstats::shared::state::AppState;
use bankstats::shared::utils::{create_conn, establish_pg_connection, redact_url, run_migrations};

const USAGE: &str = "Usage:
  bankstats [serve]                          Run migrations and start the web server
  bankstats migrate                          Apply pending database migrations
  bankstats create-user <username> <password>  Create a login or reset its password
  bankstats --help                           Show this message";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("migrate") => {
            let pool = create_conn(&config.database_url, 1)
                .with_context(|| format!("Failed to create pool for {}", redact_url(&config.database_url)))?;
            run_migrations(&pool)
        }
        Some("create-user") => {
            let (Some(username), Some(password)) = (args.get(1), args.get(2)) else {
                bail!("create-user needs <username> <password>\n\n{USAGE}");
            };
            let mut conn = establish_pg_connection(&config.database_url)?;
            let id = upsert_user(&mut conn, username.trim(), password)?;
            info!("[AUTH] User '{}' is ready ({})", username.trim(), id);
            Ok(())
        }
        Some("--help") | Some("-h") => {
            println!("{USAGE}");
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            bail!("Unknown command: {other}")
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(
        "Connecting to {} (max {} connections)",
        redact_url(&config.database_url),
        config.database.max_connections
    );
    let pool = match create_conn(&config.database_url, config.database.max_connections) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(e.into());
        }
    };
    run_migrations(&pool)?;

    let app_state = Arc::new(AppState::new(pool, config));
    run_server(app_state).await?;
    info!("Server stopped");
    Ok(())
}

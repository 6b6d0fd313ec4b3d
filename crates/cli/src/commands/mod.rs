//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

/// Connect to the database named by `VERDANT_DATABASE_URL`.
///
/// Mirrors the server's pool settings (WAL, foreign keys, create-if-missing).
pub async fn connect() -> Result<SqlitePool, sqlx::Error> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("VERDANT_DATABASE_URL").unwrap_or_else(|_| "sqlite:verdant.db".to_owned());

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePool::connect_with(options).await
}

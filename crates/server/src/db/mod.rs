//! Database operations for the Verdant `SQLite` store.
//!
//! # Tables
//!
//! - `users` - Accounts, admin flag, prepaid balance
//! - `products` - Catalog with inventory counts
//! - `orders` - Orders with frozen line-item snapshots
//! - `promo_codes` / `promo_code_uses` - Discount codes and redemptions
//! - `reviews` - Moderated product reviews
//! - `payment_details` / `settings` - Admin-editable configuration
//! - `notifications` - Per-user in-app notifications
//!
//! # Conventions
//!
//! Each entity has a repository struct over [`SqlitePool`] and a private row
//! struct with exactly one row-to-domain conversion. Monetary columns are
//! `TEXT`, converted through [`verdant_core::money`]. Methods that must run
//! inside a caller's transaction take `&mut SqliteConnection` explicitly.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! ```

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub mod notifications;
pub mod orders;
pub mod products;
pub mod promo_codes;
pub mod reviews;
pub mod settings;
pub mod users;

/// Error type shared by all repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The targeted row does not exist.
    #[error("not found")]
    NotFound,
}

impl RepositoryError {
    /// Shorthand for mapping conversion failures at the row boundary.
    pub(crate) fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// Enables WAL journaling and foreign keys, and creates the database file if
/// it does not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Run the embedded migration set against a pool.
///
/// Used by server startup and by tests; the CLI runs the same set.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Fresh in-memory database with the full migration set applied.
    ///
    /// A single pooled connection keeps the `:memory:` database alive for
    /// the whole test (every connection would otherwise get its own).
    #[allow(clippy::expect_used)]
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        super::run_migrations(&pool).await.expect("migrations");
        pool
    }
}

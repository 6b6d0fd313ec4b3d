//! Payment details and site settings repository.
//!
//! `payment_details` is a single-row entity; `settings` is a key/value map.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::PaymentDetails;

/// Fields of a payment-details update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PaymentDetailsUpdate {
    pub recipient: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub instructions: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PaymentDetailsRow {
    recipient: String,
    bank_name: String,
    account_number: String,
    instructions: String,
    updated_at: DateTime<Utc>,
}

impl PaymentDetailsRow {
    fn into_domain(self) -> PaymentDetails {
        PaymentDetails {
            recipient: self.recipient,
            bank_name: self.bank_name,
            account_number: self.account_number,
            instructions: self.instructions,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for settings database operations.
pub struct SettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the bank-transfer payment details shown at checkout.
    ///
    /// The row is seeded by the initial migration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn payment_details(&self) -> Result<PaymentDetails, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentDetailsRow>(
            "SELECT recipient, bank_name, account_number, instructions, updated_at \
             FROM payment_details WHERE id = 1",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_domain())
    }

    /// Update the payment details; unset fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_payment_details(
        &self,
        update: &PaymentDetailsUpdate,
    ) -> Result<PaymentDetails, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentDetailsRow>(
            "UPDATE payment_details SET \
                 recipient = COALESCE(?1, recipient), \
                 bank_name = COALESCE(?2, bank_name), \
                 account_number = COALESCE(?3, account_number), \
                 instructions = COALESCE(?4, instructions), \
                 updated_at = ?5 \
             WHERE id = 1 \
             RETURNING recipient, bank_name, account_number, instructions, updated_at",
        )
        .bind(update.recipient.as_deref())
        .bind(update.bank_name.as_deref())
        .bind(update.account_number.as_deref())
        .bind(update.instructions.as_deref())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_domain())
    }

    /// All site settings as a key/value map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<BTreeMap<String, String>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Upsert one setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

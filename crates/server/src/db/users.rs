//! User repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use verdant_core::{Email, UserId, money};

use super::RepositoryError;
use crate::models::User;

/// Fields an account holder (or an admin) may edit on a profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    is_admin: bool,
    balance: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, address, is_admin, balance, \
                            created_at, updated_at";

impl UserRow {
    /// The single row-to-domain mapping for users.
    fn into_domain(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(RepositoryError::corrupt)?;
        let balance = money::parse_db(&self.balance).map_err(RepositoryError::corrupt)?;

        Ok(User {
            id: UserId::new(self.id),
            email,
            name: self.name,
            phone: self.phone,
            address: self.address,
            is_admin: self.is_admin,
            balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_domain).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_domain).transpose()
    }

    /// Get a user together with their password hash, for login verification.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let hash = row.password_hash.clone();
        Ok(Some((row.into_domain()?, hash)))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, name, is_admin, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(is_admin)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_domain()
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_domain).collect()
    }

    /// Update profile fields; unset fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &UpdateProfile,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 name = COALESCE(?2, name), \
                 phone = COALESCE(?3, phone), \
                 address = COALESCE(?4, address), \
                 updated_at = ?5 \
             WHERE id = ?1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Grant or revoke the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET is_admin = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_admin)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add to a user's prepaid balance (admin top-up). Negative amounts are
    /// rejected by the handler, not here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::DataCorruption` if the stored balance is invalid.
    pub async fn add_balance(&self, id: UserId, amount: Decimal) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = get_by_id_tx(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        let new_balance = user.balance + amount;

        set_balance_tx(&mut tx, id, new_balance).await?;
        let updated = get_by_id_tx(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a user.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Fetch a user inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id_tx(
    conn: &mut SqliteConnection,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(UserRow::into_domain).transpose()
}

/// Overwrite a user's balance inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub async fn set_balance_tx(
    conn: &mut SqliteConnection,
    id: UserId,
    balance: Decimal,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE users SET balance = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(money::to_db(balance))
        .bind(Utc::now())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use rust_decimal::dec;

    #[tokio::test]
    async fn test_create_and_fetch_roundtrip() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("fern@example.com").unwrap();
        let created = repo.create(&email, "hash", "Fern Fan", false).await.unwrap();
        assert_eq!(created.email.as_str(), "fern@example.com");
        assert_eq!(created.balance, Decimal::ZERO);
        assert!(!created.is_admin);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Fern Fan");

        let by_email = repo.get_by_email(&email).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("dup@example.com").unwrap();
        repo.create(&email, "hash", "First", false).await.unwrap();
        let err = repo.create(&email, "hash", "Second", false).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_add_balance_accumulates() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("rich@example.com").unwrap();
        let user = repo.create(&email, "hash", "Rich", false).await.unwrap();

        let after = repo.add_balance(user.id, dec!(250.50)).await.unwrap();
        assert_eq!(after.balance, dec!(250.50));

        let after = repo.add_balance(user.id, dec!(49.50)).await.unwrap();
        assert_eq!(after.balance, dec!(300));
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("edit@example.com").unwrap();
        let user = repo.create(&email, "hash", "Before", false).await.unwrap();

        let updated = repo
            .update_profile(
                user.id,
                &UpdateProfile {
                    phone: Some("+123456".to_owned()),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Before");
        assert_eq!(updated.phone.as_deref(), Some("+123456"));
    }
}

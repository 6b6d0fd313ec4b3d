//! Promo code and redemption repository.
//!
//! Codes are stored uppercase; lookups normalize the input so "spring10"
//! finds "SPRING10". The UNIQUE(promo_code_id, user_id) constraint on the
//! uses table is the hard backstop for single-use-per-user.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use verdant_core::{DiscountType, OrderId, PromoCodeId, PromoCodeUseId, UserId, money};

use super::RepositoryError;
use crate::models::{PromoCode, PromoCodeUse};

/// Fields of a promo create/update. `None` leaves the column unchanged on
/// update.
#[derive(Debug, Clone, Default)]
pub struct PromoCodeInput {
    pub code: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub min_order_amount: Option<Option<Decimal>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_uses: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct PromoCodeRow {
    id: i64,
    code: String,
    discount_type: String,
    discount_value: String,
    min_order_amount: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_uses: Option<i64>,
    current_uses: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

const PROMO_COLUMNS: &str = "id, code, discount_type, discount_value, min_order_amount, \
                             starts_at, ends_at, max_uses, current_uses, is_active, created_at";

impl PromoCodeRow {
    /// The single row-to-domain mapping for promo codes.
    fn into_domain(self) -> Result<PromoCode, RepositoryError> {
        let discount_type = self
            .discount_type
            .parse::<DiscountType>()
            .map_err(RepositoryError::corrupt)?;
        let discount_value =
            money::parse_db(&self.discount_value).map_err(RepositoryError::corrupt)?;
        let min_order_amount = self
            .min_order_amount
            .as_deref()
            .map(money::parse_db)
            .transpose()
            .map_err(RepositoryError::corrupt)?;

        Ok(PromoCode {
            id: PromoCodeId::new(self.id),
            code: self.code,
            discount_type,
            discount_value,
            min_order_amount,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            max_uses: self.max_uses,
            current_uses: self.current_uses,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PromoCodeUseRow {
    id: i64,
    promo_code_id: i64,
    user_id: i64,
    order_id: i64,
    discount: String,
    created_at: DateTime<Utc>,
}

impl PromoCodeUseRow {
    fn into_domain(self) -> Result<PromoCodeUse, RepositoryError> {
        let discount = money::parse_db(&self.discount).map_err(RepositoryError::corrupt)?;
        Ok(PromoCodeUse {
            id: PromoCodeUseId::new(self.id),
            promo_code_id: PromoCodeId::new(self.promo_code_id),
            user_id: UserId::new(self.user_id),
            order_id: OrderId::new(self.order_id),
            discount,
            created_at: self.created_at,
        })
    }
}

/// Normalize a user-supplied code for storage and lookup.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Repository for promo code database operations.
pub struct PromoCodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PromoCodeRepository<'a> {
    /// Create a new promo code repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a promo code by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PromoCodeId) -> Result<Option<PromoCode>, RepositoryError> {
        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(PromoCodeRow::into_domain).transpose()
    }

    /// Get a promo code by its (normalized) code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<PromoCode>, RepositoryError> {
        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = ?1"
        ))
        .bind(normalize_code(code))
        .fetch_optional(self.pool)
        .await?;

        row.map(PromoCodeRow::into_domain).transpose()
    }

    /// List all promo codes, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<PromoCode>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PromoCodeRow::into_domain).collect()
    }

    /// Create a promo code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::DataCorruption` if required fields are missing.
    pub async fn create(&self, input: &PromoCodeInput) -> Result<PromoCode, RepositoryError> {
        let code = input
            .code
            .as_deref()
            .map(normalize_code)
            .ok_or_else(|| RepositoryError::corrupt("promo code is required"))?;
        let discount_type = input
            .discount_type
            .ok_or_else(|| RepositoryError::corrupt("discount type is required"))?;
        let discount_value = input
            .discount_value
            .ok_or_else(|| RepositoryError::corrupt("discount value is required"))?;
        let starts_at = input
            .starts_at
            .ok_or_else(|| RepositoryError::corrupt("start date is required"))?;
        let ends_at = input
            .ends_at
            .ok_or_else(|| RepositoryError::corrupt("end date is required"))?;

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "INSERT INTO promo_codes \
                 (code, discount_type, discount_value, min_order_amount, starts_at, ends_at, \
                  max_uses, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             RETURNING {PROMO_COLUMNS}"
        ))
        .bind(code)
        .bind(discount_type.to_string())
        .bind(money::to_db(discount_value))
        .bind(input.min_order_amount.flatten().map(money::to_db))
        .bind(starts_at)
        .bind(ends_at)
        .bind(input.max_uses.flatten())
        .bind(input.is_active.unwrap_or(true))
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("promo code already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_domain()
    }

    /// Update a promo code; unset fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist.
    pub async fn update(
        &self,
        id: PromoCodeId,
        input: &PromoCodeInput,
    ) -> Result<PromoCode, RepositoryError> {
        let clear_min = matches!(input.min_order_amount, Some(None));
        let clear_max = matches!(input.max_uses, Some(None));

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "UPDATE promo_codes SET \
                 code = COALESCE(?2, code), \
                 discount_type = COALESCE(?3, discount_type), \
                 discount_value = COALESCE(?4, discount_value), \
                 min_order_amount = CASE WHEN ?5 THEN NULL ELSE COALESCE(?6, min_order_amount) END, \
                 starts_at = COALESCE(?7, starts_at), \
                 ends_at = COALESCE(?8, ends_at), \
                 max_uses = CASE WHEN ?9 THEN NULL ELSE COALESCE(?10, max_uses) END, \
                 is_active = COALESCE(?11, is_active) \
             WHERE id = ?1 \
             RETURNING {PROMO_COLUMNS}"
        ))
        .bind(id)
        .bind(input.code.as_deref().map(normalize_code))
        .bind(input.discount_type.map(|t| t.to_string()))
        .bind(input.discount_value.map(money::to_db))
        .bind(clear_min)
        .bind(input.min_order_amount.flatten().map(money::to_db))
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(clear_max)
        .bind(input.max_uses.flatten())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain()
    }

    /// Delete a promo code.
    ///
    /// # Returns
    ///
    /// Returns `true` if the code was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: PromoCodeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM promo_codes WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a user has already redeemed this promo.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_user_used(
        &self,
        promo_code_id: PromoCodeId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promo_code_uses WHERE promo_code_id = ?1 AND user_id = ?2",
        )
        .bind(promo_code_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }
}

/// Fetch a promo code by normalized code inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_code_tx(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<PromoCode>, RepositoryError> {
    let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
        "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = ?1"
    ))
    .bind(normalize_code(code))
    .fetch_optional(conn)
    .await?;

    row.map(PromoCodeRow::into_domain).transpose()
}

/// Whether a user has already redeemed this promo (transaction variant).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn has_user_used_tx(
    conn: &mut SqliteConnection,
    promo_code_id: PromoCodeId,
    user_id: UserId,
) -> Result<bool, RepositoryError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM promo_code_uses WHERE promo_code_id = ?1 AND user_id = ?2",
    )
    .bind(promo_code_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(count > 0)
}

/// Record a redemption and bump the use counter, inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already redeemed this
/// promo (unique constraint backstop).
pub async fn record_use_tx(
    conn: &mut SqliteConnection,
    promo_code_id: PromoCodeId,
    user_id: UserId,
    order_id: OrderId,
    discount: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO promo_code_uses (promo_code_id, user_id, order_id, discount, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(promo_code_id)
    .bind(user_id)
    .bind(order_id)
    .bind(money::to_db(discount))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("promo code already used".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    sqlx::query("UPDATE promo_codes SET current_uses = current_uses + 1 WHERE id = ?1")
        .bind(promo_code_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Find the redemption attached to an order inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_use_for_order_tx(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Option<PromoCodeUse>, RepositoryError> {
    let row = sqlx::query_as::<_, PromoCodeUseRow>(
        "SELECT id, promo_code_id, user_id, order_id, discount, created_at \
         FROM promo_code_uses WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;

    row.map(PromoCodeUseRow::into_domain).transpose()
}

/// Reverse a redemption: delete the use row and decrement the counter,
/// inside an open transaction. The counter never goes negative.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn reverse_use_tx(
    conn: &mut SqliteConnection,
    use_record: &PromoCodeUse,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM promo_code_uses WHERE id = ?1")
        .bind(use_record.id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("UPDATE promo_codes SET current_uses = MAX(current_uses - 1, 0) WHERE id = ?1")
        .bind(use_record.promo_code_id)
        .execute(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use chrono::Duration;
    use rust_decimal::dec;

    fn valid_input(code: &str) -> PromoCodeInput {
        let now = Utc::now();
        PromoCodeInput {
            code: Some(code.to_owned()),
            discount_type: Some(DiscountType::Percentage),
            discount_value: Some(dec!(10)),
            starts_at: Some(now - Duration::days(1)),
            ends_at: Some(now + Duration::days(30)),
            max_uses: Some(Some(5)),
            ..PromoCodeInput::default()
        }
    }

    #[tokio::test]
    async fn test_code_normalized_on_create_and_lookup() {
        let pool = memory_pool().await;
        let repo = PromoCodeRepository::new(&pool);

        let created = repo.create(&valid_input("spring10")).await.unwrap();
        assert_eq!(created.code, "SPRING10");

        let found = repo.get_by_code("  Spring10 ").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let pool = memory_pool().await;
        let repo = PromoCodeRepository::new(&pool);

        repo.create(&valid_input("TWICE")).await.unwrap();
        let err = repo.create(&valid_input("twice")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}

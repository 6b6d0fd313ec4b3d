//! Notification repository.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use verdant_core::{NotificationId, OrderId, UserId};

use super::RepositoryError;
use crate::models::Notification;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    user_id: i64,
    order_id: Option<i64>,
    kind: String,
    body: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, order_id, kind, body, is_read, created_at";

impl NotificationRow {
    fn into_domain(self) -> Notification {
        Notification {
            id: NotificationId::new(self.id),
            user_id: UserId::new(self.user_id),
            order_id: self.order_id.map(OrderId::new),
            kind: self.kind,
            body: self.body,
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List one user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(NotificationRow::into_domain).collect())
    }

    /// Create a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        order_id: Option<OrderId>,
        kind: &str,
        body: &str,
    ) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications (user_id, order_id, kind, body, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(order_id)
        .bind(kind)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_domain())
    }

    /// Mark a notification as read. Scoped to the owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the notification doesn't exist
    /// or belongs to another user.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Create a notification inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn create_tx(
    conn: &mut SqliteConnection,
    user_id: UserId,
    order_id: Option<OrderId>,
    kind: &str,
    body: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO notifications (user_id, order_id, kind, body, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(user_id)
    .bind(order_id)
    .bind(kind)
    .bind(body)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

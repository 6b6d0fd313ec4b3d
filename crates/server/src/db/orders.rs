//! Order repository.
//!
//! Line items live in the `items` JSON column; (de)serialization happens
//! exactly once, in `OrderRow::into_domain` / `items_json`. The rest of the
//! application only ever sees `Vec<OrderItem>`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use verdant_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId, money};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

/// Everything needed to persist a new order. Totals are computed by the
/// checkout service before this struct is built.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub items_total: Decimal,
    pub discount: Decimal,
    pub delivery_amount: Decimal,
    pub total_amount: Decimal,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub delivery_type: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub promo_code: Option<String>,
}

/// Admin-editable order fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AdminOrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub comment: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    items: String,
    items_total: String,
    discount: String,
    delivery_amount: String,
    total_amount: String,
    full_name: String,
    address: String,
    phone: String,
    delivery_type: String,
    payment_method: String,
    payment_status: String,
    status: String,
    promo_code: Option<String>,
    payment_proof: Option<String>,
    tracking_number: Option<String>,
    delivery_date: Option<NaiveDate>,
    comment: Option<String>,
    quantities_reduced: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, user_id, items, items_total, discount, delivery_amount, \
                             total_amount, full_name, address, phone, delivery_type, \
                             payment_method, payment_status, status, promo_code, payment_proof, \
                             tracking_number, delivery_date, comment, quantities_reduced, \
                             created_at, updated_at";

impl OrderRow {
    /// The single row-to-domain mapping for orders.
    fn into_domain(self) -> Result<Order, RepositoryError> {
        let items: Vec<OrderItem> =
            serde_json::from_str(&self.items).map_err(RepositoryError::corrupt)?;
        let items_total = money::parse_db(&self.items_total).map_err(RepositoryError::corrupt)?;
        let discount = money::parse_db(&self.discount).map_err(RepositoryError::corrupt)?;
        let delivery_amount =
            money::parse_db(&self.delivery_amount).map_err(RepositoryError::corrupt)?;
        let total_amount =
            money::parse_db(&self.total_amount).map_err(RepositoryError::corrupt)?;
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(RepositoryError::corrupt)?;
        let payment_status = self
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(RepositoryError::corrupt)?;
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::corrupt)?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            items,
            items_total,
            discount,
            delivery_amount,
            total_amount,
            full_name: self.full_name,
            address: self.address,
            phone: self.phone,
            delivery_type: self.delivery_type,
            payment_method,
            payment_status,
            status,
            promo_code: self.promo_code,
            payment_proof: self.payment_proof,
            tracking_number: self.tracking_number,
            delivery_date: self.delivery_date,
            comment: self.comment,
            quantities_reduced: self.quantities_reduced,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn items_json(items: &[OrderItem]) -> Result<String, RepositoryError> {
    serde_json::to_string(items).map_err(RepositoryError::corrupt)
}

/// Repository for order reads outside a transaction.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// List all orders, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }

    /// List one user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }
}

/// Insert a new order inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_tx(
    conn: &mut SqliteConnection,
    new_order: &NewOrder,
) -> Result<Order, RepositoryError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (user_id, items, items_total, discount, delivery_amount, total_amount, full_name, \
              address, phone, delivery_type, payment_method, payment_status, status, promo_code, \
              quantities_reduced, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?15) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(new_order.user_id)
    .bind(items_json(&new_order.items)?)
    .bind(money::to_db(new_order.items_total))
    .bind(money::to_db(new_order.discount))
    .bind(money::to_db(new_order.delivery_amount))
    .bind(money::to_db(new_order.total_amount))
    .bind(&new_order.full_name)
    .bind(&new_order.address)
    .bind(&new_order.phone)
    .bind(&new_order.delivery_type)
    .bind(new_order.payment_method.to_string())
    .bind(new_order.payment_status.to_string())
    .bind(new_order.status.to_string())
    .bind(new_order.promo_code.as_deref())
    .bind(now)
    .fetch_one(conn)
    .await?;

    row.into_domain()
}

/// Fetch an order inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_tx(
    conn: &mut SqliteConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(OrderRow::into_domain).transpose()
}

/// Apply admin field updates inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn update_admin_fields_tx(
    conn: &mut SqliteConnection,
    id: OrderId,
    update: &AdminOrderUpdate,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET \
             status = COALESCE(?2, status), \
             payment_status = COALESCE(?3, payment_status), \
             comment = COALESCE(?4, comment), \
             tracking_number = COALESCE(?5, tracking_number), \
             delivery_date = COALESCE(?6, delivery_date), \
             updated_at = ?7 \
         WHERE id = ?1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(update.status.map(|s| s.to_string()))
    .bind(update.payment_status.map(|s| s.to_string()))
    .bind(update.comment.as_deref())
    .bind(update.tracking_number.as_deref())
    .bind(update.delivery_date)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.into_domain()
}

/// Set the `quantities_reduced` idempotency flag inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn set_quantities_reduced_tx(
    conn: &mut SqliteConnection,
    id: OrderId,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE orders SET quantities_reduced = 1, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Attach a payment proof and move payment status inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn set_payment_proof_tx(
    conn: &mut SqliteConnection,
    id: OrderId,
    proof_url: &str,
    payment_status: PaymentStatus,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET payment_proof = ?2, payment_status = ?3, updated_at = ?4 \
         WHERE id = ?1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(proof_url)
    .bind(payment_status.to_string())
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.into_domain()
}

/// Record an applied promo (code, discount, new total) inside an open
/// transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn set_promo_tx(
    conn: &mut SqliteConnection,
    id: OrderId,
    code: &str,
    discount: Decimal,
    total_amount: Decimal,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET promo_code = ?2, discount = ?3, total_amount = ?4, updated_at = ?5 \
         WHERE id = ?1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(code)
    .bind(money::to_db(discount))
    .bind(money::to_db(total_amount))
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.into_domain()
}

/// Delete an order row inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn delete_tx(conn: &mut SqliteConnection, id: OrderId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

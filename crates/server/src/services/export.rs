//! CSV exports for the admin back-office.
//!
//! Exports are semicolon-delimited and UTF-8 BOM-prefixed so spreadsheet
//! applications open them with correct encoding and column splitting.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::{ProductFilter, ProductRepository};
use crate::db::users::UserRepository;

/// UTF-8 byte order mark, prepended for spreadsheet compatibility.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Errors that can occur while building an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer error: {0}")]
    Buffer(String),
}

/// CSV export service.
pub struct ExportService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ExportService<'a> {
    /// Create a new export service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Export all users.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the query or serialization fails.
    pub async fn users_csv(&self) -> Result<Vec<u8>, ExportError> {
        let users = UserRepository::new(self.pool).list().await?;

        let mut writer = csv_writer();
        writer.write_record([
            "id", "email", "name", "phone", "address", "is_admin", "balance", "created_at",
        ])?;
        for user in users {
            writer.write_record([
                user.id.to_string(),
                user.email.to_string(),
                user.name,
                user.phone.unwrap_or_default(),
                user.address.unwrap_or_default(),
                user.is_admin.to_string(),
                user.balance.to_string(),
                user.created_at.to_rfc3339(),
            ])?;
        }

        finish(writer)
    }

    /// Export the full catalog.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the query or serialization fails.
    pub async fn products_csv(&self) -> Result<Vec<u8>, ExportError> {
        let products = ProductRepository::new(self.pool)
            .list(&ProductFilter::default())
            .await?;

        let mut writer = csv_writer();
        writer.write_record([
            "id",
            "name",
            "category",
            "price",
            "original_price",
            "quantity",
            "is_available",
            "is_preorder",
            "is_rare",
            "is_easy_care",
            "delivery_cost",
            "created_at",
        ])?;
        for product in products {
            writer.write_record([
                product.id.to_string(),
                product.name,
                product.category,
                product.price.to_string(),
                product
                    .original_price
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                product.quantity.to_string(),
                product.is_available.to_string(),
                product.is_preorder.to_string(),
                product.is_rare.to_string(),
                product.is_easy_care.to_string(),
                product.delivery_cost.to_string(),
                product.created_at.to_rfc3339(),
            ])?;
        }

        finish(writer)
    }

    /// Export all orders, one row per order with lines flattened.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the query or serialization fails.
    pub async fn orders_csv(&self) -> Result<Vec<u8>, ExportError> {
        let orders = OrderRepository::new(self.pool).list_all().await?;

        let mut writer = csv_writer();
        writer.write_record([
            "id",
            "user_id",
            "status",
            "payment_status",
            "payment_method",
            "items",
            "items_total",
            "discount",
            "promo_code",
            "delivery_amount",
            "total_amount",
            "created_at",
        ])?;
        for order in orders {
            let items = order
                .items
                .iter()
                .map(|i| format!("{} x{}", i.name, i.quantity))
                .collect::<Vec<_>>()
                .join(", ");
            writer.write_record([
                order.id.to_string(),
                order.user_id.to_string(),
                order.status.to_string(),
                order.payment_status.to_string(),
                order.payment_method.to_string(),
                items,
                order.items_total.to_string(),
                order.discount.to_string(),
                order.promo_code.unwrap_or_default(),
                order.delivery_amount.to_string(),
                order.total_amount.to_string(),
                order.created_at.to_rfc3339(),
            ])?;
        }

        finish(writer)
    }

    /// Export shop-wide statistics as metric/value rows.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if a query or serialization fails.
    pub async fn statistics_csv(&self) -> Result<Vec<u8>, ExportError> {
        let total_users = self.count("SELECT COUNT(*) FROM users").await?;
        let total_products = self.count("SELECT COUNT(*) FROM products").await?;
        let total_orders = self.count("SELECT COUNT(*) FROM orders").await?;
        let out_of_stock = self
            .count("SELECT COUNT(*) FROM products WHERE quantity = 0")
            .await?;
        let revenue: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CAST(total_amount AS REAL)), 0.0) FROM orders \
             WHERE status != 'cancelled'",
        )
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::Database)?;

        let mut writer = csv_writer();
        writer.write_record(["metric", "value"])?;
        writer.write_record(["total_users".to_owned(), total_users.to_string()])?;
        writer.write_record(["total_products".to_owned(), total_products.to_string()])?;
        writer.write_record(["total_orders".to_owned(), total_orders.to_string()])?;
        writer.write_record(["out_of_stock_products".to_owned(), out_of_stock.to_string()])?;
        writer.write_record(["revenue".to_owned(), format!("{revenue:.2}")])?;

        for status in [
            "pending",
            "processing",
            "paid",
            "shipped",
            "completed",
            "cancelled",
        ] {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
                .bind(status)
                .fetch_one(self.pool)
                .await
                .map_err(RepositoryError::Database)?;
            writer.write_record([format!("orders_{status}"), count.to_string()])?;
        }

        finish(writer)
    }

    async fn count(&self, sql: &str) -> Result<i64, ExportError> {
        let count: i64 = sqlx::query_scalar(sql)
            .fetch_one(self.pool)
            .await
            .map_err(RepositoryError::Database)?;
        Ok(count)
    }
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::db::users::UserRepository;
    use verdant_core::Email;

    #[tokio::test]
    async fn test_users_csv_is_bom_prefixed_and_semicolon_delimited() {
        let pool = memory_pool().await;
        UserRepository::new(&pool)
            .create(
                &Email::parse("csv@example.com").unwrap(),
                "hash",
                "Csv User",
                false,
            )
            .await
            .unwrap();

        let bytes = ExportService::new(&pool).users_csv().await.unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "id;email;name;phone;address;is_admin;balance;created_at"
        );
        assert!(text.contains("csv@example.com"));
    }

    #[tokio::test]
    async fn test_statistics_csv_has_metrics() {
        let pool = memory_pool().await;
        let bytes = ExportService::new(&pool).statistics_csv().await.unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.contains("total_users;0"));
        assert!(text.contains("revenue;0.00"));
        assert!(text.contains("orders_pending;0"));
    }
}

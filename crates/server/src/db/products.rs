//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use verdant_core::{ProductId, money};

use super::RepositoryError;
use crate::models::Product;

/// Catalog listing filters. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub available_only: bool,
    pub preorder: Option<bool>,
    pub rare: Option<bool>,
    pub easy_care: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    pub sort: ProductSort,
}

/// Catalog sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Fields of a product create/update. `None` leaves the column unchanged on
/// update; creates fill defaults.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Option<Decimal>>,
    pub images: Option<Vec<String>>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub is_available: Option<bool>,
    pub is_preorder: Option<bool>,
    pub is_rare: Option<bool>,
    pub is_easy_care: Option<bool>,
    pub labels: Option<Vec<String>>,
    pub delivery_cost: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: String,
    original_price: Option<String>,
    images: String,
    quantity: i64,
    category: String,
    is_available: bool,
    is_preorder: bool,
    is_rare: bool,
    is_easy_care: bool,
    labels: String,
    delivery_cost: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, original_price, images, quantity, \
                               category, is_available, is_preorder, is_rare, is_easy_care, \
                               labels, delivery_cost, created_at, updated_at";

impl ProductRow {
    /// The single row-to-domain mapping for products.
    fn into_domain(self) -> Result<Product, RepositoryError> {
        let price = money::parse_db(&self.price).map_err(RepositoryError::corrupt)?;
        let original_price = self
            .original_price
            .as_deref()
            .map(money::parse_db)
            .transpose()
            .map_err(RepositoryError::corrupt)?;
        let delivery_cost =
            money::parse_db(&self.delivery_cost).map_err(RepositoryError::corrupt)?;
        let images: Vec<String> =
            serde_json::from_str(&self.images).map_err(RepositoryError::corrupt)?;
        let labels: Vec<String> =
            serde_json::from_str(&self.labels).map_err(RepositoryError::corrupt)?;

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price,
            original_price,
            images,
            quantity: self.quantity,
            category: self.category,
            is_available: self.is_available,
            is_preorder: self.is_preorder,
            is_rare: self.is_rare,
            is_easy_care: self.is_easy_care,
            labels,
            delivery_cost,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductRow::into_domain).transpose()
    }

    /// List products matching a filter.
    ///
    /// Price comparisons cast the stored text to a numeric value, which is
    /// exact for the amounts this shop stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));

        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if filter.available_only {
            qb.push(" AND is_available = 1");
        }
        if let Some(preorder) = filter.preorder {
            qb.push(" AND is_preorder = ").push_bind(preorder);
        }
        if let Some(rare) = filter.rare {
            qb.push(" AND is_rare = ").push_bind(rare);
        }
        if let Some(easy_care) = filter.easy_care {
            qb.push(" AND is_easy_care = ").push_bind(easy_care);
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND CAST(price AS REAL) >= ")
                .push_bind(min.to_f64().unwrap_or_default());
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND CAST(price AS REAL) <= ")
                .push_bind(max.to_f64().unwrap_or(f64::MAX));
        }
        if let Some(search) = &filter.search {
            qb.push(" AND name LIKE '%' || ").push_bind(search).push(" || '%'");
        }

        qb.push(match filter.sort {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY CAST(price AS REAL) ASC",
            ProductSort::PriceDesc => " ORDER BY CAST(price AS REAL) DESC",
            ProductSort::Name => " ORDER BY name COLLATE NOCASE ASC",
        });

        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if required fields are
    /// missing (callers validate first) or `RepositoryError::Database` on
    /// query failure.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let name = input
            .name
            .as_deref()
            .ok_or_else(|| RepositoryError::corrupt("product name is required"))?;
        let price = input
            .price
            .ok_or_else(|| RepositoryError::corrupt("product price is required"))?;

        let images = serde_json::to_string(input.images.as_deref().unwrap_or_default())
            .map_err(RepositoryError::corrupt)?;
        let labels = serde_json::to_string(input.labels.as_deref().unwrap_or_default())
            .map_err(RepositoryError::corrupt)?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
                 (name, description, price, original_price, images, quantity, category, \
                  is_available, is_preorder, is_rare, is_easy_care, labels, delivery_cost, \
                  created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(input.description.as_deref().unwrap_or_default())
        .bind(money::to_db(price))
        .bind(input.original_price.flatten().map(money::to_db))
        .bind(images)
        .bind(input.quantity.unwrap_or(0))
        .bind(input.category.as_deref().unwrap_or_default())
        .bind(input.is_available.unwrap_or(true))
        .bind(input.is_preorder.unwrap_or(false))
        .bind(input.is_rare.unwrap_or(false))
        .bind(input.is_easy_care.unwrap_or(false))
        .bind(labels)
        .bind(money::to_db(input.delivery_cost.unwrap_or_default()))
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// Update a product; unset fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let images = input
            .images
            .as_deref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(RepositoryError::corrupt)?;
        let labels = input
            .labels
            .as_deref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(RepositoryError::corrupt)?;

        // original_price distinguishes "leave unchanged" (outer None) from
        // "clear" (Some(None)).
        let clear_original = matches!(input.original_price, Some(None));
        let original_price = input.original_price.flatten().map(money::to_db);

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET \
                 name = COALESCE(?2, name), \
                 description = COALESCE(?3, description), \
                 price = COALESCE(?4, price), \
                 original_price = CASE WHEN ?5 THEN NULL ELSE COALESCE(?6, original_price) END, \
                 images = COALESCE(?7, images), \
                 quantity = COALESCE(?8, quantity), \
                 category = COALESCE(?9, category), \
                 is_available = COALESCE(?10, is_available), \
                 is_preorder = COALESCE(?11, is_preorder), \
                 is_rare = COALESCE(?12, is_rare), \
                 is_easy_care = COALESCE(?13, is_easy_care), \
                 labels = COALESCE(?14, labels), \
                 delivery_cost = COALESCE(?15, delivery_cost), \
                 updated_at = ?16 \
             WHERE id = ?1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price.map(money::to_db))
        .bind(clear_original)
        .bind(original_price)
        .bind(images)
        .bind(input.quantity)
        .bind(input.category.as_deref())
        .bind(input.is_available)
        .bind(input.is_preorder)
        .bind(input.is_rare)
        .bind(input.is_easy_care)
        .bind(labels)
        .bind(input.delivery_cost.map(money::to_db))
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain()
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Fetch a product inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_tx(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(ProductRow::into_domain).transpose()
}

/// Decrement stock inside an open transaction, clamping at zero.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_quantity_tx(
    conn: &mut SqliteConnection,
    id: ProductId,
    by: i64,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE products SET quantity = MAX(quantity - ?2, 0), updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(by)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Restore stock inside an open transaction (order deletion).
///
/// A missing product is a no-op: the row may have been deleted since the
/// order was placed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restore_quantity_tx(
    conn: &mut SqliteConnection,
    id: ProductId,
    by: i64,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(by)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use rust_decimal::dec;

    fn input(name: &str, price: Decimal, quantity: i64) -> ProductInput {
        ProductInput {
            name: Some(name.to_owned()),
            price: Some(price),
            quantity: Some(quantity),
            category: Some("tropical".to_owned()),
            ..ProductInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let created = repo.create(&input("Monstera", dec!(500), 10)).await.unwrap();
        assert_eq!(created.price, dec!(500));
        assert_eq!(created.quantity, 10);
        assert!(created.is_available);
        assert!(created.images.is_empty());

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Monstera");
    }

    #[tokio::test]
    async fn test_list_filters_category_and_price() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        repo.create(&input("Cheap fern", dec!(10), 5)).await.unwrap();
        repo.create(&input("Pricey palm", dec!(900), 5)).await.unwrap();
        let mut cactus = input("Cactus", dec!(50), 5);
        cactus.category = Some("desert".to_owned());
        repo.create(&cactus).await.unwrap();

        let filter = ProductFilter {
            category: Some("tropical".to_owned()),
            max_price: Some(dec!(100)),
            ..ProductFilter::default()
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|p| p.name.as_str()), Some("Cheap fern"));
    }

    #[tokio::test]
    async fn test_list_search_and_sort() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        repo.create(&input("Monstera deliciosa", dec!(500), 5)).await.unwrap();
        repo.create(&input("Monstera adansonii", dec!(300), 5)).await.unwrap();
        repo.create(&input("Ficus", dec!(100), 5)).await.unwrap();

        let filter = ProductFilter {
            search: Some("monstera".to_owned()),
            sort: ProductSort::PriceAsc,
            ..ProductFilter::default()
        };
        let found = repo.list(&filter).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Monstera adansonii", "Monstera deliciosa"]);
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);
        let product = repo.create(&input("Scarce", dec!(10), 3)).await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        decrement_quantity_tx(&mut tx, product.id, 5).await.unwrap();
        tx.commit().await.unwrap();

        let after = repo.get(product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 0);
    }

    #[tokio::test]
    async fn test_update_partial_and_clear_original_price() {
        let pool = memory_pool().await;
        let repo = ProductRepository::new(&pool);

        let mut with_sale = input("Sale plant", dec!(80), 5);
        with_sale.original_price = Some(Some(dec!(100)));
        let product = repo.create(&with_sale).await.unwrap();
        assert_eq!(product.original_price, Some(dec!(100)));

        let updated = repo
            .update(
                product.id,
                &ProductInput {
                    original_price: Some(None),
                    quantity: Some(7),
                    ..ProductInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.original_price, None);
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.name, "Sale plant");
    }
}

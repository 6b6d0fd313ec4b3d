//! Database seeding command.
//!
//! Inserts a small sample catalog for local development. Idempotent: skips
//! products whose name already exists.

use chrono::Utc;
use sqlx::SqlitePool;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    quantity: i64,
    category: &'static str,
    is_rare: bool,
    is_easy_care: bool,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Monstera deliciosa",
        description: "Split-leaf classic, fast grower.",
        price: "500",
        quantity: 12,
        category: "tropical",
        is_rare: false,
        is_easy_care: true,
    },
    SeedProduct {
        name: "Ficus lyrata",
        description: "Fiddle-leaf fig, bright indirect light.",
        price: "750",
        quantity: 6,
        category: "tropical",
        is_rare: false,
        is_easy_care: false,
    },
    SeedProduct {
        name: "Monstera albo variegata",
        description: "Variegated cutting, collector grade.",
        price: "4500",
        quantity: 2,
        category: "tropical",
        is_rare: true,
        is_easy_care: false,
    },
    SeedProduct {
        name: "Sansevieria trifasciata",
        description: "Snake plant, thrives on neglect.",
        price: "250",
        quantity: 25,
        category: "succulents",
        is_rare: false,
        is_easy_care: true,
    },
    SeedProduct {
        name: "Haworthia cooperi",
        description: "Windowed succulent for bright sills.",
        price: "180",
        quantity: 18,
        category: "succulents",
        is_rare: false,
        is_easy_care: true,
    },
];

/// Insert the sample catalog.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let mut inserted = 0_u32;
    for product in SEED_PRODUCTS {
        if insert_if_missing(&pool, product).await? {
            inserted += 1;
        }
    }

    tracing::info!(inserted, total = SEED_PRODUCTS.len(), "seed complete");
    Ok(())
}

async fn insert_if_missing(pool: &SqlitePool, product: &SeedProduct) -> Result<bool, sqlx::Error> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE name = ?1")
        .bind(product.name)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO products \
             (name, description, price, quantity, category, is_rare, is_easy_care, \
              created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.category)
    .bind(product.is_rare)
    .bind(product.is_easy_care)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(true)
}

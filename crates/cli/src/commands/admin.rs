//! Admin user management commands.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use verdant_core::Email;

/// Create an admin user, or promote the account if the email already exists.
///
/// # Errors
///
/// Returns an error for an invalid email or a database failure.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("failed to hash password: {e}"))?
        .to_string();

    let pool = super::connect().await?;
    let now = Utc::now();

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?;

    match existing {
        Some(id) => {
            sqlx::query("UPDATE users SET is_admin = 1, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&pool)
                .await?;
            tracing::info!(%email, "existing account promoted to admin");
        }
        None => {
            sqlx::query(
                "INSERT INTO users (email, password_hash, name, is_admin, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            )
            .bind(&email)
            .bind(&password_hash)
            .bind(name)
            .bind(now)
            .execute(&pool)
            .await?;
            tracing::info!(%email, "admin user created");
        }
    }

    Ok(())
}

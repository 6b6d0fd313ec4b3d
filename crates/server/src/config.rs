//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (all have defaults)
//! - `VERDANT_DATABASE_URL` - `SQLite` connection string (default: `sqlite:verdant.db`)
//! - `VERDANT_HOST` - Bind address (default: 127.0.0.1)
//! - `VERDANT_PORT` - Listen port (default: 3000)
//! - `VERDANT_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `VERDANT_UPLOAD_DIR` - Directory for uploaded files (default: `uploads`)
//! - `VERDANT_RECEIPT_DIR` - Directory for generated receipts (default: `receipts`)
//! - `VERDANT_SHOP_NAME` - Shop name printed on receipts (default: `Verdant Plant Shop`)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL.
    pub database_url: String,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL (secure cookies are enabled for https).
    pub base_url: String,
    /// Directory for uploaded files (product images, payment proofs).
    pub upload_dir: PathBuf,
    /// Directory for generated PDF receipts.
    pub receipt_dir: PathBuf,
    /// Shop name printed on receipts.
    pub shop_name: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_env_or_default("VERDANT_DATABASE_URL", "sqlite:verdant.db");
        let host = get_env_or_default("VERDANT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VERDANT_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("VERDANT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VERDANT_PORT".to_owned(), e.to_string()))?;
        let base_url = get_env_or_default("VERDANT_BASE_URL", "http://localhost:3000");
        let upload_dir = PathBuf::from(get_env_or_default("VERDANT_UPLOAD_DIR", "uploads"));
        let receipt_dir = PathBuf::from(get_env_or_default("VERDANT_RECEIPT_DIR", "receipts"));
        let shop_name = get_env_or_default("VERDANT_SHOP_NAME", "Verdant Plant Shop");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            receipt_dir,
            shop_name,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over https (enables secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ServerConfig {
        ServerConfig {
            database_url: "sqlite::memory:".to_owned(),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            upload_dir: PathBuf::from("uploads"),
            receipt_dir: PathBuf::from("receipts"),
            shop_name: "Verdant Plant Shop".to_owned(),
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = sample();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = sample();
        assert!(!config.is_secure());
        config.base_url = "https://shop.example".to_owned();
        assert!(config.is_secure());
    }
}

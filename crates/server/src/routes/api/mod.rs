//! JSON API route handlers.

pub mod auth;
pub mod export;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod promo_codes;
pub mod reviews;
pub mod settings;
pub mod uploads;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent stays `None`, `null` becomes `Some(None)`, a value becomes
/// `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

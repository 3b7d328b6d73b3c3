pub mod account;
pub mod application;
pub mod company;
pub mod job;
pub mod notification;

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Accepts an id sent either as a JSON number or as a numeric string,
/// since form inputs on the client submit ids as text.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_number(deserializer)
}

/// Same as `deserialize_optional_id`, for `limit`-style query parameters.
/// `?limit=` with nothing after it reads as absent.
pub fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_number(deserializer)
}

fn deserialize_optional_number<'de, D, N>(deserializer: D) -> Result<Option<N>, D::Error>
where
    D: Deserializer<'de>,
    N: Deserialize<'de> + FromStr,
    <N as FromStr>::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<N> {
        Number(N),
        Text(String),
    }

    match Option::<Raw<N>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<N>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

/// Trims, and maps blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

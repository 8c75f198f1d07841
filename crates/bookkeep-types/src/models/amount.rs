//! Money fields as sent by the backend
//!
//! Decimal columns arrive either as JSON numbers or as numeric strings
//! (`"250.00"`), sometimes as `null`. Both shapes are accepted and read as `f64`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Null(()),
}

/// Deserialize a money value from a number, a numeric string, or null (0.0).
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(value) => Ok(value),
        RawAmount::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid amount: {text:?}")))
        }
        RawAmount::Null(()) => Ok(0.0),
    }
}

/// Extract `YYYY-MM-DD` from a backend timestamp such as `2024-03-01T00:00:00.000Z`.
pub fn parse_date(raw: &str) -> Option<chrono::NaiveDate> {
    let prefix = raw.get(..10)?;
    chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

//! Serde helpers for loosely typed API fields.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, a number or null as an optional string.
///
/// Customer and invoice numbers arrive as either depending on the account.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number, got {other}"
            )))
        }
    })
}

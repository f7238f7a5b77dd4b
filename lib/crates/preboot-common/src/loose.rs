//! Lenient field deserializers for untrusted payloads.
//!
//! Discovery and probe services are loosely typed: a field that should be a
//! number may arrive as a string, `null`, or be missing entirely. These
//! helpers never fail; anything that cannot be interpreted becomes `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number and keep it as a string. Empty strings are `None`.
///
/// # Errors
///
/// Only when the underlying deserializer fails to produce a value.
pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(string_from))
}

/// Accept a finite number or a numeric string.
///
/// # Errors
///
/// Only when the underlying deserializer fails to produce a value.
pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number_from))
}

/// Accept a JSON boolean only.
///
/// # Errors
///
/// Only when the underlying deserializer fails to produce a value.
pub fn opt_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| v.as_bool()))
}

/// Deserialize a nested object, treating anything that does not fit as absent.
///
/// # Errors
///
/// Only when the underlying deserializer fails to produce a value.
pub fn opt_object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

pub(crate) fn string_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn number_from(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    num.is_finite().then_some(num)
}

//! Lenient deserializers for fields the service sends inconsistently.

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` the same as an omitted field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `1500`, `1500.0` or `null` for a count. Negative or non-finite
/// values decode as absent.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|count| count.is_finite() && *count >= 0.0)
        .map(|count| count as u64))
}

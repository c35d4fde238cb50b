// Backend resource areas: record types (as the server sends them) plus one `ApiClient`
// method per server operation.

pub mod auth;
pub mod careers;
pub mod chat;
pub mod interview;
pub mod roadmap;
pub mod skills;
pub mod users;

use crate::error::ApiError;
use serde::{Deserialize, Deserializer};

/// For list fields the server may send as `null` as well as omit.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Percentages (skill proficiency, course progress) are bounded server-side; reject early.
pub(crate) fn check_percentage(field: &str, value: f64) -> Result<(), ApiError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "{field} must be between 0 and 100, got {value}"
        )))
    }
}

#[test]
fn test_check_percentage() {
    assert!(check_percentage("progress", 0.0).is_ok());
    assert!(check_percentage("progress", 100.0).is_ok());
    assert!(check_percentage("progress", 100.5).is_err());
    assert!(check_percentage("progress", -1.0).is_err());
    assert!(check_percentage("progress", f64::NAN).is_err());
}

// Request envelope helpers: defensive body parsing and field-by-field validation
pub mod body;
pub mod params;

pub use body::{Fields, JsonBody};
pub use params::QueryParams;

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::ApiError;

pub(crate) fn parse_i64(field: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::invalid_field(field, "deve ser um número inteiro"))
}

pub(crate) fn parse_f64(field: &str, raw: &str) -> Result<f64, ApiError> {
    // Accept Brazilian decimal comma ("10,50")
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::invalid_field(field, "deve ser um número"))
}

pub(crate) fn parse_bool(field: &str, raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "sim" => Ok(true),
        "false" | "0" | "nao" | "não" => Ok(false),
        _ => Err(ApiError::invalid_field(field, "deve ser true ou false")),
    }
}

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_field(field, "use o formato AAAA-MM-DD"))
}

pub(crate) fn positive(field: &str, value: i64) -> Result<i64, ApiError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ApiError::invalid_field(field, "deve ser positivo"))
    }
}

/// Path ids are integers; anything else is a validation error, not a routing miss
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    parse_i64("id", raw).and_then(|id| positive("id", id))
}

/// `bar_id` column of a row returned by the data client
pub fn row_bar_id(row: &Value) -> Option<i64> {
    match row.get("bar_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

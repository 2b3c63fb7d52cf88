//! Helpers for the public-data listing responses
//!
//! The zone and store services wrap their results as
//! `{header: {resultCode, resultMsg}, body: {items, totalCount}}`, though some
//! deployments return a bare `{items: [...]}` or nest items under
//! `items.item`. Field values arrive as strings or numbers.

use serde_json::Value;

use crate::error::{ResolveError, Result};
use crate::geometry::geojson::value_as_string;

/// Provider result codes
const CODE_OK: &str = "00";
const CODE_NO_DATA: &str = "03";
const AUTH_CODES: [&str; 4] = ["20", "30", "31", "32"];

/// A decoded listing body
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Items {
        items: Vec<Value>,
        total_count: Option<usize>,
    },
    /// The provider explicitly reported "no data"
    NoData,
}

/// Decode a listing body, mapping error result codes to domain errors
pub fn decode_listing(value: &Value, endpoint: &str) -> Result<Listing> {
    if let Some(header) = value.get("header") {
        let code = header.get("resultCode").and_then(value_as_string);
        let message = header
            .get("resultMsg")
            .and_then(value_as_string)
            .unwrap_or_default();
        match code.as_deref() {
            None | Some(CODE_OK) => {}
            Some(CODE_NO_DATA) => return Ok(Listing::NoData),
            Some(code) if AUTH_CODES.contains(&code) => {
                return Err(ResolveError::auth(format!("{} ({})", message, code)))
            }
            Some(code) => {
                return Err(ResolveError::parse(
                    endpoint,
                    format!("result code {}: {}", code, message),
                ))
            }
        }
    }

    let body = value.get("body").unwrap_or(value);
    let items = match body.get("items") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(wrapper)) => match wrapper.get("item") {
            Some(Value::Array(items)) => items.clone(),
            Some(item @ Value::Object(_)) => vec![item.clone()],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    let total_count = body
        .get("totalCount")
        .and_then(value_as_string)
        .and_then(|count| count.parse::<usize>().ok());

    Ok(Listing::Items { items, total_count })
}

/// First present field among `keys`, as a string
pub fn str_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find_map(value_as_string)
}

/// First present field among `keys`, as a number
pub fn f64_field(item: &Value, keys: &[&str]) -> Option<f64> {
    str_field(item, keys).and_then(|value| value.parse::<f64>().ok())
}

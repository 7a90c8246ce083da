//! Wire types for the location search endpoint.
//!
//! ## Observed shape
//!
//! The endpoint answers with a JSON:API-style document:
//!
//! ```json
//! { "data": [ { "id": "1234", "type": "location-search-results",
//!               "attributes": { "name": "...", "latitude": 44.1, ... },
//!               "links": { "self": "https://..." } } ] }
//! ```
//!
//! Attribute keys are kebab-case. Numeric attributes (coordinates, prices,
//! counts, rating) have been seen both as JSON numbers and as numeric
//! strings, so they are kept as raw [`serde_json::Value`] here and coerced
//! by the normalizer. Every field is optional at this layer; deciding what is
//! mandatory belongs to `normalize.rs`.
//!
//! Items are decoded one at a time (see [`decode_item`]) so a single
//! malformed item is skipped instead of failing the whole page.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ScraperError;

/// One page of search results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub attributes: RawAttributes,

    #[serde(default)]
    pub links: RawLinks,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLinks {
    #[serde(rename = "self")]
    pub self_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawAttributes {
    pub name: Option<String>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub region_name: Option<String>,
    pub administrative_area: Option<String>,
    pub nearest_city_name: Option<String>,
    pub accommodation_type_names: Option<Vec<String>>,
    pub bookable: Option<Value>,
    pub camper_types: Option<Vec<String>>,
    pub operator: Option<String>,
    pub photo_url: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub photos_count: Option<Value>,
    pub rating: Option<Value>,
    pub reviews_count: Option<Value>,
    pub slug: Option<String>,
    pub price_low: Option<Value>,
    pub price_high: Option<Value>,
    pub availability_updated_at: Option<String>,
    pub address: Option<String>,
}

/// Decodes a single search result.
///
/// # Errors
///
/// Returns [`ScraperError::Validation`] when the item does not match the
/// expected shape, e.g. `name` given as a number.
pub fn decode_item(value: Value) -> Result<RawItem, ScraperError> {
    let id = value.get("id").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    serde_json::from_value::<RawItem>(value).map_err(|e| ScraperError::Validation {
        id,
        reason: format!("malformed search result: {e}"),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

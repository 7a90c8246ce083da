//! Turns raw search results into validated [`CampgroundRecord`]s.
//!
//! Default policy for absent or malformed fields:
//!
//! | field | rule |
//! |-------|------|
//! | id, type, self link, name | required, non-empty |
//! | latitude, longitude | required, finite number or numeric string |
//! | region name | region-name, else administrative-area, else `"Unknown"` |
//! | prices | zero, empty or absent becomes `None` |
//! | counts | `0` |
//! | collections | empty |
//! | bookable | boolean, `"true"`/`"false"` or `1`/`0`, else `false` |
//! | availability timestamp | `None` when unparseable (logged) |
//! | address | upstream value, else name joined with area parts, `None` only if all are blank (geocoded later) |

use campdb_core::{CampgroundRecord, UNKNOWN_REGION};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::RawItem;

/// Normalizes one decoded search result.
///
/// # Errors
///
/// Returns [`ScraperError::Validation`] if any mandatory field is missing or
/// a coordinate is not a finite number.
pub fn normalize_item(raw: RawItem) -> Result<CampgroundRecord, ScraperError> {
    let id = non_empty(raw.id).ok_or_else(|| ScraperError::Validation {
        id: None,
        reason: "missing id".to_owned(),
    })?;

    let reject = |reason: &str| ScraperError::Validation {
        id: Some(id.clone()),
        reason: reason.to_owned(),
    };

    let kind = non_empty(raw.kind).ok_or_else(|| reject("missing type"))?;
    let self_link = non_empty(raw.links.self_link).ok_or_else(|| reject("missing self link"))?;

    let attrs = raw.attributes;
    let name = non_empty(attrs.name).ok_or_else(|| reject("missing name"))?;
    let latitude = attrs
        .latitude
        .as_ref()
        .and_then(coerce_f64)
        .ok_or_else(|| reject("missing or non-numeric latitude"))?;
    let longitude = attrs
        .longitude
        .as_ref()
        .and_then(coerce_f64)
        .ok_or_else(|| reject("missing or non-numeric longitude"))?;

    let received_region = non_empty(attrs.region_name);
    let administrative_area = non_empty(attrs.administrative_area);
    let nearest_city_name = non_empty(attrs.nearest_city_name);

    let region_name = received_region
        .clone()
        .or_else(|| administrative_area.clone())
        .unwrap_or_else(|| UNKNOWN_REGION.to_owned());

    let address = non_empty(attrs.address).or_else(|| {
        derive_address(
            &name,
            &[
                administrative_area.as_deref(),
                nearest_city_name.as_deref(),
                received_region.as_deref(),
            ],
        )
    });

    let price_low = coerce_price(&id, "price-low", attrs.price_low.as_ref());
    let price_high = coerce_price(&id, "price-high", attrs.price_high.as_ref());

    let availability_updated_at = non_empty(attrs.availability_updated_at).and_then(|raw_ts| {
        let parsed = parse_timestamp(&raw_ts);
        if parsed.is_none() {
            tracing::warn!(
                id = %id,
                value = %raw_ts,
                "unparseable availability-updated-at; leaving it empty"
            );
        }
        parsed
    });

    Ok(CampgroundRecord {
        kind,
        self_link,
        name,
        latitude,
        longitude,
        region_name,
        administrative_area,
        nearest_city_name,
        accommodation_type_names: attrs.accommodation_type_names.unwrap_or_default(),
        bookable: coerce_bool(&id, attrs.bookable.as_ref()),
        camper_types: attrs.camper_types.unwrap_or_default(),
        operator: non_empty(attrs.operator),
        photo_url: non_empty(attrs.photo_url),
        photo_urls: attrs.photo_urls.unwrap_or_default(),
        photos_count: coerce_count(attrs.photos_count.as_ref()),
        rating: attrs.rating.as_ref().and_then(coerce_f64),
        reviews_count: coerce_count(attrs.reviews_count.as_ref()),
        slug: non_empty(attrs.slug),
        price_low,
        price_high,
        availability_updated_at,
        address,
        id,
    })
}

/// Joins `name` and the non-empty location parts with `", "`.
///
/// Returns `None` only when every part, the name included, is blank; the
/// caller then falls back to geocoding.
fn derive_address(name: &str, locality: &[Option<&str>]) -> Option<String> {
    let parts: Vec<&str> = std::iter::once(Some(name))
        .chain(locality.iter().copied())
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_owned())
        }
    })
}

/// Reads a finite `f64` out of a JSON number or numeric string.
fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Prices follow a "falsy means absent" rule: `0`, `"0"`, `""` and `null`
/// all become `None`.
fn coerce_price(id: &str, field: &str, value: Option<&Value>) -> Option<f64> {
    let value = value?;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => match coerce_f64(other) {
            Some(n) if n.abs() < f64::EPSILON => None,
            Some(n) => Some(n),
            None => {
                tracing::warn!(id, field, value = %other, "non-numeric price; leaving it empty");
                None
            }
        },
    }
}

/// Booleans arrive as JSON booleans, `"true"`/`"false"` strings or `1`/`0`.
fn coerce_bool(id: &str, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") || s.trim() == "1" => true,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("false") || s.trim() == "0" => false,
        Some(Value::Number(n)) if n.as_i64() == Some(1) => true,
        Some(Value::Number(n)) if n.as_i64() == Some(0) => false,
        Some(other) => {
            tracing::warn!(id, value = %other, "unrecognised bookable flag; treating it as false");
            false
        }
    }
}

fn coerce_count(value: Option<&Value>) -> i32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n >= 0)
        .unwrap_or(0)
}

/// Accepts RFC 3339, a naive ISO-8601 date-time (taken as UTC), or a bare
/// `YYYY-MM-DD` date (midnight UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

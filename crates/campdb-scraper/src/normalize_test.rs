use chrono::TimeZone;
use serde_json::{json, Value};

use super::*;
use crate::types::decode_item;

fn raw_item(value: Value) -> RawItem {
    decode_item(value).expect("fixture should decode")
}

fn full_item() -> Value {
    json!({
        "id": "1001",
        "type": "location-search-results",
        "attributes": {
            "name": "Juniper Springs",
            "latitude": 29.18,
            "longitude": -81.71,
            "region-name": "Florida",
            "administrative-area": "Ocala National Forest",
            "nearest-city-name": "Silver Springs",
            "accommodation-type-names": ["Tent", "RV"],
            "bookable": true,
            "camper-types": ["tent", "rv"],
            "operator": "USFS",
            "photo-url": "https://cdn.example/1.jpg",
            "photo-urls": ["https://cdn.example/1.jpg", "https://cdn.example/2.jpg"],
            "photos-count": 2,
            "rating": 4.5,
            "reviews-count": 88,
            "slug": "florida-juniper-springs",
            "price-low": 25.0,
            "price-high": "40.50",
            "availability-updated-at": "2024-05-01T12:30:00Z"
        },
        "links": { "self": "https://thedyrt.com/api/v6/locations/1001" }
    })
}

// -----------------------------------------------------------------------
// Mandatory fields
// -----------------------------------------------------------------------

#[test]
fn full_item_normalizes_every_field() {
    let record = normalize_item(raw_item(full_item())).unwrap();
    assert_eq!(record.id, "1001");
    assert_eq!(record.kind, "location-search-results");
    assert_eq!(record.self_link, "https://thedyrt.com/api/v6/locations/1001");
    assert_eq!(record.name, "Juniper Springs");
    assert!((record.latitude - 29.18).abs() < f64::EPSILON);
    assert!((record.longitude - -81.71).abs() < f64::EPSILON);
    assert_eq!(record.region_name, "Florida");
    assert_eq!(record.accommodation_type_names, vec!["Tent", "RV"]);
    assert!(record.bookable);
    assert_eq!(record.photos_count, 2);
    assert_eq!(record.reviews_count, 88);
    assert_eq!(record.rating, Some(4.5));
    assert_eq!(record.price_low, Some(25.0));
    assert_eq!(record.price_high, Some(40.5));
    assert_eq!(
        record.availability_updated_at,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
    );
}

#[test]
fn rejects_missing_mandatory_fields() {
    for (pointer, key) in [
        ("", "id"),
        ("", "type"),
        ("/attributes", "name"),
        ("/attributes", "latitude"),
        ("/attributes", "longitude"),
        ("/links", "self"),
    ] {
        let mut value = full_item();
        value
            .pointer_mut(pointer)
            .and_then(Value::as_object_mut)
            .unwrap()
            .remove(key);
        let result = normalize_item(raw_item(value));
        assert!(
            matches!(result, Err(ScraperError::Validation { .. })),
            "expected rejection when {key} is missing, got {result:?}"
        );
    }
}

#[test]
fn rejects_blank_name() {
    let mut value = full_item();
    value["attributes"]["name"] = json!("   ");
    let err = normalize_item(raw_item(value)).unwrap_err();
    assert!(matches!(
        err,
        ScraperError::Validation { id: Some(ref id), .. } if id == "1001"
    ));
}

#[test]
fn rejects_non_numeric_latitude() {
    let mut value = full_item();
    value["attributes"]["latitude"] = json!("north-ish");
    assert!(normalize_item(raw_item(value)).is_err());
}

#[test]
fn accepts_string_coordinates() {
    let mut value = full_item();
    value["attributes"]["latitude"] = json!("29.18");
    value["attributes"]["longitude"] = json!(" -81.71 ");
    let record = normalize_item(raw_item(value)).unwrap();
    assert!((record.longitude - -81.71).abs() < f64::EPSILON);
}

// -----------------------------------------------------------------------
// Region name fallback
// -----------------------------------------------------------------------

#[test]
fn region_falls_back_to_administrative_area() {
    let mut value = full_item();
    value["attributes"]
        .as_object_mut()
        .unwrap()
        .remove("region-name");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(record.region_name, "Ocala National Forest");
}

#[test]
fn region_defaults_to_unknown() {
    let mut value = full_item();
    let attrs = value["attributes"].as_object_mut().unwrap();
    attrs.remove("region-name");
    attrs.insert("administrative-area".to_owned(), json!(""));
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(record.region_name, UNKNOWN_REGION);
    assert_eq!(record.region_name, "Unknown");
}

// -----------------------------------------------------------------------
// Prices, counts, collections
// -----------------------------------------------------------------------

#[test]
fn falsy_prices_become_none() {
    for falsy in [json!(0), json!("0"), json!(""), json!(null), json!(0.0)] {
        let mut value = full_item();
        value["attributes"]["price-low"] = falsy.clone();
        let record = normalize_item(raw_item(value)).unwrap();
        assert_eq!(record.price_low, None, "price {falsy} should be absent");
    }
}

#[test]
fn garbage_price_becomes_none() {
    let mut value = full_item();
    value["attributes"]["price-high"] = json!("call for rates");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(record.price_high, None);
}

#[test]
fn minimal_item_gets_defaults() {
    let record = normalize_item(raw_item(json!({
        "id": "7",
        "type": "location-search-results",
        "attributes": { "name": "Bare Camp", "latitude": 40.0, "longitude": -105.0 },
        "links": { "self": "https://thedyrt.com/api/v6/locations/7" }
    })))
    .unwrap();

    assert!(record.accommodation_type_names.is_empty());
    assert!(record.camper_types.is_empty());
    assert!(record.photo_urls.is_empty());
    assert!(!record.bookable);
    assert_eq!(record.photos_count, 0);
    assert_eq!(record.reviews_count, 0);
    assert_eq!(record.rating, None);
    assert_eq!(record.availability_updated_at, None);
}

#[test]
fn string_counts_are_parsed() {
    let mut value = full_item();
    value["attributes"]["reviews-count"] = json!("12");
    value["attributes"]["photos-count"] = json!("lots");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(record.reviews_count, 12);
    assert_eq!(record.photos_count, 0);
}

// -----------------------------------------------------------------------
// Timestamps
// -----------------------------------------------------------------------

#[test]
fn parse_timestamp_accepts_offsets() {
    assert_eq!(
        parse_timestamp("2024-05-01T14:30:00+02:00"),
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
    );
}

#[test]
fn parse_timestamp_treats_naive_as_utc() {
    assert_eq!(
        parse_timestamp("2024-05-01T12:30:00.250"),
        Some(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
                + chrono::Duration::milliseconds(250)
        )
    );
}

#[test]
fn parse_timestamp_accepts_bare_date() {
    assert_eq!(
        parse_timestamp("2024-05-01"),
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn bad_timestamp_does_not_reject_record() {
    let mut value = full_item();
    value["attributes"]["availability-updated-at"] = json!("last tuesday");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(record.availability_updated_at, None);
}

// -----------------------------------------------------------------------
// Address
// -----------------------------------------------------------------------

#[test]
fn address_prefers_upstream_value() {
    let mut value = full_item();
    value["attributes"]["address"] = json!("1 Forest Rd, Silver Springs, FL");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(
        record.address.as_deref(),
        Some("1 Forest Rd, Silver Springs, FL")
    );
}

#[test]
fn address_is_derived_from_name_and_area_parts() {
    let record = normalize_item(raw_item(full_item())).unwrap();
    assert_eq!(
        record.address.as_deref(),
        Some("Juniper Springs, Ocala National Forest, Silver Springs, Florida")
    );
}

#[test]
fn derived_address_uses_region_as_received() {
    let mut value = full_item();
    let attrs = value["attributes"].as_object_mut().unwrap();
    attrs.remove("region-name");
    attrs.remove("nearest-city-name");
    let record = normalize_item(raw_item(value)).unwrap();
    assert_eq!(
        record.address.as_deref(),
        Some("Juniper Springs, Ocala National Forest")
    );
}

#[test]
fn derive_address_keeps_name_without_location_parts() {
    assert_eq!(
        derive_address("Bare Camp", &[None, Some(""), Some("  ")]).as_deref(),
        Some("Bare Camp")
    );
}

#[test]
fn derive_address_is_none_only_when_everything_is_blank() {
    assert_eq!(derive_address("  ", &[None, Some(""), Some(" ")]), None);
}

#[test]
fn item_without_location_parts_uses_name_as_address() {
    let record = normalize_item(raw_item(json!({
        "id": "8",
        "type": "location-search-results",
        "attributes": { "name": "Lonely Pines", "latitude": 44.0, "longitude": -110.0 },
        "links": { "self": "https://thedyrt.com/api/v6/locations/8" }
    })))
    .unwrap();
    assert_eq!(record.address.as_deref(), Some("Lonely Pines"));
    assert_eq!(record.region_name, "Unknown");
}

// -----------------------------------------------------------------------
// Bookable
// -----------------------------------------------------------------------

fn bookable_from(flag: Value) -> bool {
    let mut value = full_item();
    value["attributes"]["bookable"] = flag;
    normalize_item(raw_item(value)).unwrap().bookable
}

#[test]
fn bookable_accepts_string_flags() {
    assert!(bookable_from(json!("true")));
    assert!(bookable_from(json!("TRUE")));
    assert!(!bookable_from(json!("false")));
}

#[test]
fn bookable_accepts_numeric_flags() {
    assert!(bookable_from(json!(1)));
    assert!(!bookable_from(json!(0)));
    assert!(bookable_from(json!("1")));
}

#[test]
fn unrecognised_bookable_does_not_reject_record() {
    assert!(!bookable_from(json!("maybe")));
    assert!(!bookable_from(Value::Null));
}

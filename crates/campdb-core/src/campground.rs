use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder region name used when the upstream gives neither a region nor
/// an administrative area.
pub const UNKNOWN_REGION: &str = "Unknown";

/// A campground scraped from the search API, normalized for storage.
///
/// Built once by the scraper's normalizer and never mutated afterwards;
/// persistence copies its fields onto the stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampgroundRecord {
    /// Stable upstream identifier, the primary key across crawls.
    pub id: String,
    /// Upstream resource type, e.g. `"location-search-results"`.
    pub kind: String,
    /// Canonical API link for this resource.
    pub self_link: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Never empty: falls back to the administrative area, then [`UNKNOWN_REGION`].
    pub region_name: String,
    pub administrative_area: Option<String>,
    pub nearest_city_name: Option<String>,
    pub accommodation_type_names: Vec<String>,
    pub bookable: bool,
    pub camper_types: Vec<String>,
    pub operator: Option<String>,
    pub photo_url: Option<String>,
    pub photo_urls: Vec<String>,
    pub photos_count: i32,
    pub rating: Option<f64>,
    pub reviews_count: i32,
    pub slug: Option<String>,
    pub price_low: Option<f64>,
    pub price_high: Option<f64>,
    pub availability_updated_at: Option<DateTime<Utc>>,
    /// Human-readable address, either derived from the name/area fields or
    /// resolved by reverse geocoding.
    pub address: Option<String>,
}

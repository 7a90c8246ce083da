use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use campdb_db::PersistedCampground;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CampgroundsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampgroundItem {
    id: String,
    kind: String,
    self_link: String,
    name: String,
    latitude: f64,
    longitude: f64,
    region_name: String,
    administrative_area: Option<String>,
    nearest_city_name: Option<String>,
    address: Option<String>,
    accommodation_type_names: Vec<String>,
    bookable: bool,
    camper_types: Vec<String>,
    operator: Option<String>,
    photo_url: Option<String>,
    photo_urls: Vec<String>,
    photos_count: i32,
    rating: Option<f64>,
    reviews_count: i32,
    slug: Option<String>,
    price_low: Option<f64>,
    price_high: Option<f64>,
    availability_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PersistedCampground> for CampgroundItem {
    fn from(row: PersistedCampground) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            self_link: row.self_link,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            region_name: row.region_name,
            administrative_area: row.administrative_area,
            nearest_city_name: row.nearest_city_name,
            address: row.address,
            accommodation_type_names: row.accommodation_type_names,
            bookable: row.bookable,
            camper_types: row.camper_types,
            operator: row.operator,
            photo_url: row.photo_url,
            photo_urls: row.photo_urls,
            photos_count: row.photos_count,
            rating: row.rating,
            reviews_count: row.reviews_count,
            slug: row.slug,
            price_low: row.price_low,
            price_high: row.price_high,
            availability_updated_at: row.availability_updated_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn normalize_page(query: &CampgroundsQuery) -> (i64, i64) {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}

pub(super) async fn list_campgrounds(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CampgroundsQuery>,
) -> Result<Json<ApiResponse<Vec<CampgroundItem>>>, ApiError> {
    let (limit, offset) = normalize_page(&query);
    let rows = campdb_db::list_campgrounds(&state.pool, limit, offset)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CampgroundItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_campground(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CampgroundItem>>, ApiError> {
    let row = campdb_db::get_campground(&state.pool, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CampgroundItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

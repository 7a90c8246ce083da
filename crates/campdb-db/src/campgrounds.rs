//! Persistence for the `campgrounds` table.
//!
//! Writes go through [`reconcile_campgrounds`], which dedups a crawl's
//! output by id (first occurrence wins) and merges it into the stored rows
//! inside one transaction.

use std::collections::{HashMap, HashSet};

use campdb_core::CampgroundRecord;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

const CAMPGROUND_COLUMNS: &str = "id, kind, self_link, name, latitude, longitude, region_name, \
     administrative_area, nearest_city_name, accommodation_type_names, bookable, camper_types, \
     operator, photo_url, photo_urls, photos_count, rating, reviews_count, slug, price_low, \
     price_high, availability_updated_at, address, created_at, updated_at";

/// A row from the `campgrounds` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PersistedCampground {
    pub id: String,
    pub kind: String,
    pub self_link: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
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
    pub address: Option<String>,
    /// Set once, on first insert.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write.
    pub updated_at: DateTime<Utc>,
}

impl PersistedCampground {
    /// A brand-new row for `record`, stamped `now` for both timestamps.
    #[must_use]
    pub fn from_record(record: &CampgroundRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind.clone(),
            self_link: record.self_link.clone(),
            name: record.name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            region_name: record.region_name.clone(),
            administrative_area: record.administrative_area.clone(),
            nearest_city_name: record.nearest_city_name.clone(),
            accommodation_type_names: record.accommodation_type_names.clone(),
            bookable: record.bookable,
            camper_types: record.camper_types.clone(),
            operator: record.operator.clone(),
            photo_url: record.photo_url.clone(),
            photo_urls: record.photo_urls.clone(),
            photos_count: record.photos_count,
            rating: record.rating,
            reviews_count: record.reviews_count,
            slug: record.slug.clone(),
            price_low: record.price_low,
            price_high: record.price_high,
            availability_updated_at: record.availability_updated_at,
            address: record.address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every mutable field with the values from `record`.
    ///
    /// `id` and `created_at` are left alone; `updated_at` becomes `now`.
    pub fn apply_record(&mut self, record: &CampgroundRecord, now: DateTime<Utc>) {
        debug_assert_eq!(self.id, record.id);
        self.kind.clone_from(&record.kind);
        self.self_link.clone_from(&record.self_link);
        self.name.clone_from(&record.name);
        self.latitude = record.latitude;
        self.longitude = record.longitude;
        self.region_name.clone_from(&record.region_name);
        self.administrative_area
            .clone_from(&record.administrative_area);
        self.nearest_city_name.clone_from(&record.nearest_city_name);
        self.accommodation_type_names
            .clone_from(&record.accommodation_type_names);
        self.bookable = record.bookable;
        self.camper_types.clone_from(&record.camper_types);
        self.operator.clone_from(&record.operator);
        self.photo_url.clone_from(&record.photo_url);
        self.photo_urls.clone_from(&record.photo_urls);
        self.photos_count = record.photos_count;
        self.rating = record.rating;
        self.reviews_count = record.reviews_count;
        self.slug.clone_from(&record.slug);
        self.price_low = record.price_low;
        self.price_high = record.price_high;
        self.availability_updated_at = record.availability_updated_at;
        self.address.clone_from(&record.address);
        self.updated_at = now;
    }
}

/// Counts from one [`reconcile_campgrounds`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Rows inserted or updated (`inserted + updated`).
    pub written: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Later occurrences of an id already seen in the same batch.
    pub duplicates_skipped: usize,
}

/// Keeps the first record for each id, preserving input order.
///
/// Returns the survivors and the number of records dropped.
#[must_use]
pub fn dedup_first_seen(records: &[CampgroundRecord]) -> (Vec<&CampgroundRecord>, usize) {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.as_str()) {
            unique.push(record);
        }
    }
    let skipped = records.len() - unique.len();
    (unique, skipped)
}

/// Reconciles a crawl batch against the stored catalog.
///
/// Duplicate ids within `records` are dropped (first occurrence wins). Each
/// surviving record either inserts a new row or overwrites the existing one
/// via [`PersistedCampground::apply_record`]. Existing rows are locked with
/// `FOR UPDATE` for the duration of the write. The whole batch runs in one
/// transaction: on any failure nothing is committed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn reconcile_campgrounds(
    pool: &PgPool,
    records: &[CampgroundRecord],
) -> Result<ReconcileSummary, DbError> {
    let (unique, duplicates_skipped) = dedup_first_seen(records);
    let mut summary = ReconcileSummary {
        duplicates_skipped,
        ..ReconcileSummary::default()
    };
    if unique.is_empty() {
        return Ok(summary);
    }
    if duplicates_skipped > 0 {
        tracing::debug!(duplicates_skipped, "dropped duplicate ids from batch");
    }

    let now = Utc::now();
    let ids: Vec<String> = unique.iter().map(|r| r.id.clone()).collect();

    let mut tx = pool.begin().await?;

    let locked: Vec<PersistedCampground> = sqlx::query_as::<_, PersistedCampground>(&format!(
        "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds \
         WHERE id = ANY($1) \
         ORDER BY id \
         FOR UPDATE"
    ))
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?;
    let mut existing: HashMap<String, PersistedCampground> = locked
        .into_iter()
        .map(|row| (row.id.clone(), row))
        .collect();

    for record in unique {
        if let Some(mut row) = existing.remove(&record.id) {
            row.apply_record(record, now);
            update_campground(&mut tx, &row).await?;
            summary.updated += 1;
        } else {
            let row = PersistedCampground::from_record(record, now);
            insert_campground(&mut tx, &row).await?;
            summary.inserted += 1;
        }
    }

    tx.commit().await?;

    summary.written = summary.inserted + summary.updated;
    tracing::info!(
        written = summary.written,
        inserted = summary.inserted,
        updated = summary.updated,
        duplicates_skipped = summary.duplicates_skipped,
        "campgrounds reconciled"
    );
    Ok(summary)
}

async fn insert_campground(
    tx: &mut Transaction<'_, Postgres>,
    row: &PersistedCampground,
) -> Result<(), DbError> {
    sqlx::query(&format!(
        "INSERT INTO campgrounds ({CAMPGROUND_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                 $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)"
    ))
    .bind(&row.id)
    .bind(&row.kind)
    .bind(&row.self_link)
    .bind(&row.name)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(&row.region_name)
    .bind(&row.administrative_area)
    .bind(&row.nearest_city_name)
    .bind(&row.accommodation_type_names)
    .bind(row.bookable)
    .bind(&row.camper_types)
    .bind(&row.operator)
    .bind(&row.photo_url)
    .bind(&row.photo_urls)
    .bind(row.photos_count)
    .bind(row.rating)
    .bind(row.reviews_count)
    .bind(&row.slug)
    .bind(row.price_low)
    .bind(row.price_high)
    .bind(row.availability_updated_at)
    .bind(&row.address)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_campground(
    tx: &mut Transaction<'_, Postgres>,
    row: &PersistedCampground,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE campgrounds SET \
             kind = $2, self_link = $3, name = $4, latitude = $5, longitude = $6, \
             region_name = $7, administrative_area = $8, nearest_city_name = $9, \
             accommodation_type_names = $10, bookable = $11, camper_types = $12, \
             operator = $13, photo_url = $14, photo_urls = $15, photos_count = $16, \
             rating = $17, reviews_count = $18, slug = $19, price_low = $20, \
             price_high = $21, availability_updated_at = $22, address = $23, \
             updated_at = $24 \
         WHERE id = $1",
    )
    .bind(&row.id)
    .bind(&row.kind)
    .bind(&row.self_link)
    .bind(&row.name)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(&row.region_name)
    .bind(&row.administrative_area)
    .bind(&row.nearest_city_name)
    .bind(&row.accommodation_type_names)
    .bind(row.bookable)
    .bind(&row.camper_types)
    .bind(&row.operator)
    .bind(&row.photo_url)
    .bind(&row.photo_urls)
    .bind(row.photos_count)
    .bind(row.rating)
    .bind(row.reviews_count)
    .bind(&row.slug)
    .bind(row.price_low)
    .bind(row.price_high)
    .bind(row.availability_updated_at)
    .bind(&row.address)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns one page of campgrounds ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campgrounds(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<PersistedCampground>, DbError> {
    let rows = sqlx::query_as::<_, PersistedCampground>(&format!(
        "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds \
         ORDER BY id \
         LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_campgrounds(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM campgrounds")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Fetches a single campground by its upstream id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_campground(pool: &PgPool, id: &str) -> Result<PersistedCampground, DbError> {
    let row = sqlx::query_as::<_, PersistedCampground>(&format!(
        "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

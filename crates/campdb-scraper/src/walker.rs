//! Drains the paginated result set for one region.

use std::sync::Arc;
use std::time::Duration;

use campdb_core::{AppConfig, BoundingBox, CampgroundRecord};
use futures::stream::{self, Stream, TryStreamExt};

use crate::client::SearchClient;
use crate::error::ScraperError;
use crate::geocode::ReverseGeocoder;
use crate::normalize::normalize_item;
use crate::types::decode_item;

/// Maximum number of pages walked for one region before giving up.
///
/// Guards against an upstream that never returns a short page. Each page may
/// itself be retried, so the worst-case request count per region is
/// `MAX_PAGES * (1 + max_retries)`.
pub const MAX_PAGES: u32 = 500;

/// Pages through one region's search results, normalizing as it goes.
#[derive(Debug, Clone)]
pub struct PageWalker {
    client: Arc<SearchClient>,
    geocoder: Option<Arc<ReverseGeocoder>>,
    page_size: u32,
    inter_request_delay: Duration,
}

impl PageWalker {
    #[must_use]
    pub fn new(client: Arc<SearchClient>, page_size: u32, inter_request_delay_ms: u64) -> Self {
        Self {
            client,
            geocoder: None,
            page_size: page_size.max(1),
            inter_request_delay: Duration::from_millis(inter_request_delay_ms),
        }
    }

    /// Builds a walker (and its geocoder, when enabled) from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if either HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Arc::new(SearchClient::from_app_config(config)?);
        let walker = Self::new(
            client,
            config.scraper_page_size,
            config.scraper_inter_request_delay_ms,
        );
        if config.geocoder_enabled {
            let geocoder = ReverseGeocoder::from_app_config(config)?;
            Ok(walker.with_geocoder(Arc::new(geocoder)))
        } else {
            Ok(walker)
        }
    }

    /// Resolves missing addresses through `geocoder`.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Lazily walks pages 1, 2, … of `region`.
    ///
    /// The stream ends after the first page holding fewer than `page_size`
    /// items (an empty first page gives an empty stream). Items that fail
    /// validation are logged and skipped. A page request that still fails
    /// after retries is yielded as an `Err` and ends the stream.
    pub fn walk(
        &self,
        region: BoundingBox,
    ) -> impl Stream<Item = Result<CampgroundRecord, ScraperError>> + Send + '_ {
        stream::try_unfold(Some(1u32), move |next| async move {
            let Some(page) = next else {
                return Ok(None);
            };

            if page > MAX_PAGES {
                return Err(ScraperError::PaginationLimit {
                    region: region.to_string(),
                    max_pages: MAX_PAGES,
                });
            }

            if page > 1 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            let response = self.client.fetch_page(&region, page, self.page_size).await?;
            let item_count = response.data.len();
            let records = self.normalize_page(response.data).await;

            let full_page = usize::try_from(self.page_size).is_ok_and(|size| item_count >= size);
            tracing::debug!(
                region = %region,
                page,
                item_count,
                accepted = records.len(),
                "search page processed"
            );

            let next = (item_count > 0 && full_page).then_some(page + 1);
            Ok(Some((records, next)))
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok)))
        .try_flatten()
    }

    async fn normalize_page(&self, items: Vec<serde_json::Value>) -> Vec<CampgroundRecord> {
        let mut records = Vec::with_capacity(items.len());
        for value in items {
            match decode_item(value).and_then(normalize_item) {
                Ok(mut record) => {
                    if record.address.is_none() {
                        record.address = self.resolve_address(&record).await;
                    }
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid search result");
                }
            }
        }
        records
    }

    /// Best-effort reverse geocoding; failures are logged, never surfaced.
    async fn resolve_address(&self, record: &CampgroundRecord) -> Option<String> {
        let geocoder = self.geocoder.as_ref()?;
        match geocoder.reverse(record.latitude, record.longitude).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(
                    id = %record.id,
                    latitude = record.latitude,
                    longitude = record.longitude,
                    error = %e,
                    "could not resolve address from coordinates"
                );
                None
            }
        }
    }
}

//! Concurrent crawl over a partitioned bounding box.

use campdb_core::{AppConfig, BoundingBox, CampgroundRecord};
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::ScraperError;
use crate::grid::partition;
use crate::walker::PageWalker;

/// Result of one crawl. `records` may hold the same id more than once when a
/// campground sits on a shared cell edge; deduplication happens on write.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub records: Vec<CampgroundRecord>,
    pub regions_total: usize,
    pub regions_failed: usize,
}

impl CrawlOutcome {
    /// `true` when there was at least one region and none of them succeeded.
    #[must_use]
    pub fn all_regions_failed(&self) -> bool {
        self.regions_total > 0 && self.regions_failed == self.regions_total
    }
}

/// Walks every cell of a grid with at most `max_concurrent_regions` cells in
/// flight at once.
#[derive(Debug, Clone)]
pub struct Crawler {
    walker: PageWalker,
    divisions: u32,
    max_concurrent_regions: usize,
}

impl Crawler {
    #[must_use]
    pub fn new(walker: PageWalker, divisions: u32, max_concurrent_regions: usize) -> Self {
        Self {
            walker,
            divisions,
            max_concurrent_regions: max_concurrent_regions.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError`] if an HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(
            PageWalker::from_app_config(config)?,
            config.scraper_grid_divisions,
            config.scraper_max_concurrent_regions,
        ))
    }

    /// The sub-regions a crawl of `root` would visit, in dispatch order.
    #[must_use]
    pub fn plan(&self, root: BoundingBox) -> Vec<BoundingBox> {
        partition(root, self.divisions)
    }

    /// Crawls `root` and returns everything collected.
    ///
    /// A region whose walk fails is logged and contributes nothing, not even
    /// the records it produced before failing; the remaining regions carry on.
    /// Dropping the returned future cancels every in-flight region.
    pub async fn crawl(&self, root: BoundingBox) -> CrawlOutcome {
        let regions = self.plan(root);
        let regions_total = regions.len();
        tracing::info!(
            root = %root,
            regions_total,
            max_concurrent = self.max_concurrent_regions,
            "starting crawl"
        );

        let results: Vec<(BoundingBox, Result<Vec<CampgroundRecord>, ScraperError>)> =
            stream::iter(regions)
                .map(|region| async move {
                    tracing::info!(region = %region, "processing region");
                    let result = self.walker.walk(region).try_collect::<Vec<_>>().await;
                    (region, result)
                })
                .buffer_unordered(self.max_concurrent_regions)
                .collect()
                .await;

        let mut outcome = CrawlOutcome {
            regions_total,
            ..CrawlOutcome::default()
        };
        for (region, result) in results {
            match result {
                Ok(records) => {
                    tracing::info!(region = %region, count = records.len(), "region complete");
                    outcome.records.extend(records);
                }
                Err(e) => {
                    tracing::warn!(region = %region, error = %e, "region failed; skipping");
                    outcome.regions_failed += 1;
                }
            }
        }

        tracing::info!(
            collected = outcome.records.len(),
            regions_total = outcome.regions_total,
            regions_failed = outcome.regions_failed,
            "crawl complete"
        );
        outcome
    }
}

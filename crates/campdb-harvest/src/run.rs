use campdb_core::BoundingBox;
use campdb_db::{CrawlRunCounts, CrawlRunRow};
use campdb_scraper::Crawler;
use sqlx::PgPool;

use crate::{HarvestError, HarvestSummary, TriggerSource};

/// Records a new `queued` crawl run without starting it.
///
/// Split from [`execute_harvest`] so the server can hand the run id back to
/// the caller before the crawl itself begins.
///
/// # Errors
///
/// Returns [`HarvestError::Db`] if the run cannot be inserted.
pub async fn begin_harvest(
    pool: &PgPool,
    trigger: TriggerSource,
) -> Result<CrawlRunRow, HarvestError> {
    let run = campdb_db::create_crawl_run(pool, trigger.as_str()).await?;
    tracing::info!(
        run_id = run.id,
        public_id = %run.public_id,
        trigger = %trigger,
        "crawl run queued"
    );
    Ok(run)
}

/// Drives a queued run to completion: start, crawl `root`, reconcile, then
/// mark the run `succeeded` or `failed`.
///
/// Regional failures never fail the run, even when every region fails; the
/// counts on the run row record them. A persistence failure rolls the whole
/// batch back and fails the run.
///
/// # Errors
///
/// Returns [`HarvestError::Db`] when the run cannot be started, the batch
/// cannot be reconciled or the run cannot be completed.
pub async fn execute_harvest(
    pool: &PgPool,
    crawler: &Crawler,
    root: BoundingBox,
    run: &CrawlRunRow,
) -> Result<HarvestSummary, HarvestError> {
    campdb_db::start_crawl_run(pool, run.id).await?;

    let outcome = crawler.crawl(root).await;
    let records_collected = outcome.records.len();
    let partial_counts = CrawlRunCounts::new(
        outcome.regions_total,
        outcome.regions_failed,
        records_collected,
        0,
    );

    if outcome.all_regions_failed() {
        tracing::warn!(
            run_id = run.id,
            regions_total = outcome.regions_total,
            "every region failed; completing the run with no records"
        );
    } else if outcome.regions_failed > 0 {
        tracing::warn!(
            run_id = run.id,
            regions_failed = outcome.regions_failed,
            regions_total = outcome.regions_total,
            "some regions failed; persisting the rest"
        );
    }

    let reconcile = match campdb_db::reconcile_campgrounds(pool, &outcome.records).await {
        Ok(summary) => summary,
        Err(err) => {
            fail_run_best_effort(pool, run.id, &format!("{err:#}"), partial_counts).await;
            return Err(err.into());
        }
    };

    let counts = CrawlRunCounts::new(
        outcome.regions_total,
        outcome.regions_failed,
        records_collected,
        reconcile.written,
    );
    if let Err(err) = campdb_db::complete_crawl_run(pool, run.id, counts).await {
        fail_run_best_effort(pool, run.id, &format!("{err:#}"), counts).await;
        return Err(err.into());
    }

    tracing::info!(
        run_id = run.id,
        regions_total = outcome.regions_total,
        regions_failed = outcome.regions_failed,
        records_collected,
        inserted = reconcile.inserted,
        updated = reconcile.updated,
        duplicates_skipped = reconcile.duplicates_skipped,
        "crawl run succeeded"
    );

    Ok(HarvestSummary {
        run_id: run.id,
        public_id: run.public_id,
        regions_total: outcome.regions_total,
        regions_failed: outcome.regions_failed,
        records_collected,
        reconcile,
    })
}

/// [`begin_harvest`] followed by [`execute_harvest`].
///
/// # Errors
///
/// See [`execute_harvest`].
pub async fn run_harvest(
    pool: &PgPool,
    crawler: &Crawler,
    root: BoundingBox,
    trigger: TriggerSource,
) -> Result<HarvestSummary, HarvestError> {
    let run = begin_harvest(pool, trigger).await?;
    execute_harvest(pool, crawler, root, &run).await
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: &str, counts: CrawlRunCounts) {
    if let Err(mark_err) = campdb_db::fail_crawl_run(pool, run_id, message, counts).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark crawl run as failed"
        );
    }
}

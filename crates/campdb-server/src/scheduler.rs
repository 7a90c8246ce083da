//! Background job scheduler.
//!
//! Registers the recurring full crawl at startup. The job shares the
//! server's [`CrawlGuard`](crate::crawl_guard::CrawlGuard), so a tick that
//! lands while a manually triggered crawl is still running is skipped.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::AppState;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` is not a valid six-field expression, or the scheduler fails to
/// start.
pub async fn build_scheduler(state: AppState, cron: &str) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_crawl_job(&scheduler, state, cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_crawl_job(
    scheduler: &JobScheduler,
    state: AppState,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            run_scheduled_crawl(&state).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered crawl job");
    Ok(())
}

async fn run_scheduled_crawl(state: &AppState) {
    let Some(_permit) = state.crawl_guard.try_acquire() else {
        tracing::warn!("scheduler: a crawl is already running; skipping this tick");
        return;
    };

    tracing::info!("scheduler: starting crawl");
    match campdb_harvest::run_harvest(
        &state.pool,
        &state.crawler,
        state.crawl_bounds,
        campdb_harvest::TriggerSource::Scheduler,
    )
    .await
    {
        Ok(summary) => tracing::info!(
            run_id = summary.run_id,
            records_collected = summary.records_collected,
            written = summary.reconcile.written,
            regions_failed = summary.regions_failed,
            "scheduler: crawl complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: crawl failed"),
    }
}

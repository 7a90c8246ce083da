//! End-to-end harvest job: crawl the configured extent, reconcile the
//! results into `campgrounds` and record the attempt in `crawl_runs`.
//!
//! Shared by the CLI (`campdb-cli crawl`) and the server's trigger endpoint
//! and scheduler.

mod run;

use std::fmt;

use campdb_db::{DbError, ReconcileSummary};
use thiserror::Error;
use uuid::Uuid;

pub use run::{begin_harvest, execute_harvest, run_harvest};

/// Who asked for a crawl. Stored verbatim in `crawl_runs.trigger_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Cli,
    Api,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Api => "api",
            Self::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Db(#[from] DbError),
}

/// What one successful harvest did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub run_id: i64,
    pub public_id: Uuid,
    pub regions_total: usize,
    pub regions_failed: usize,
    /// Records returned by the crawl, before deduplication.
    pub records_collected: usize,
    pub reconcile: ReconcileSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_source_strings_match_crawl_runs_check_constraint() {
        assert_eq!(TriggerSource::Cli.as_str(), "cli");
        assert_eq!(TriggerSource::Api.as_str(), "api");
        assert_eq!(TriggerSource::Scheduler.to_string(), "scheduler");
    }
}

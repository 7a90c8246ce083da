use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use campdb_db::CrawlRunRow;
use campdb_harvest::{HarvestError, TriggerSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CrawlRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CrawlRunItem {
    crawl_run_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    regions_total: i32,
    regions_failed: i32,
    records_collected: i32,
    records_saved: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CrawlRunRow> for CrawlRunItem {
    fn from(row: CrawlRunRow) -> Self {
        Self {
            crawl_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            regions_total: row.regions_total,
            regions_failed: row.regions_failed,
            records_collected: row.records_collected,
            records_saved: row.records_saved,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CrawlStatus {
    running: bool,
    latest_run: Option<CrawlRunItem>,
}

fn normalize_runs_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

/// Queues a crawl and runs it in the background.
///
/// Responds `202` with the queued run as soon as it is recorded; the crawl
/// itself continues after the response is sent. A second trigger while a
/// crawl is in flight gets `409`.
pub(super) async fn trigger_crawl(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<CrawlRunItem>>), ApiError> {
    let Some(permit) = state.crawl_guard.try_acquire() else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "a crawl is already running",
        ));
    };

    let run = match campdb_harvest::begin_harvest(&state.pool, TriggerSource::Api).await {
        Ok(run) => run,
        Err(HarvestError::Db(e)) => {
            tracing::error!(error = %e, "failed to queue crawl run");
            return Err(map_db_error(req_id.0, &e));
        }
    };

    let background_run = run.clone();
    tokio::spawn(async move {
        let _permit = permit;
        if let Err(e) = campdb_harvest::execute_harvest(
            &state.pool,
            &state.crawler,
            state.crawl_bounds,
            &background_run,
        )
        .await
        {
            tracing::error!(
                run_id = background_run.id,
                error = %e,
                "api-triggered crawl failed"
            );
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: CrawlRunItem::from(run),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn crawl_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CrawlStatus>>, ApiError> {
    let latest = campdb_db::latest_crawl_run(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CrawlStatus {
            running: state.crawl_guard.is_running(),
            latest_run: latest.map(CrawlRunItem::from),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_crawl_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CrawlRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CrawlRunItem>>>, ApiError> {
    let rows = campdb_db::list_crawl_runs(&state.pool, normalize_runs_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CrawlRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_run_item_uses_public_id() {
        let public_id = Uuid::new_v4();
        let item = CrawlRunItem::from(CrawlRunRow {
            id: 7,
            public_id,
            trigger_source: "api".to_string(),
            status: "queued".to_string(),
            started_at: None,
            completed_at: None,
            regions_total: 0,
            regions_failed: 0,
            records_collected: 0,
            records_saved: 0,
            error_message: None,
            created_at: Utc::now(),
        });

        let json = serde_json::to_value(&item).expect("serialize crawl run");
        assert_eq!(json["crawl_run_id"], public_id.to_string());
        assert_eq!(json["status"], "queued");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn runs_limit_defaults_and_clamps() {
        assert_eq!(normalize_runs_limit(None), 20);
        assert_eq!(normalize_runs_limit(Some(0)), 1);
        assert_eq!(normalize_runs_limit(Some(1_000)), 100);
    }
}

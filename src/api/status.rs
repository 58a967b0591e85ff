/// Liveness and probe status endpoints
use crate::{
    context::AppContext,
    db::{aggregate_buckets, StatusDataPoint},
    error::OctaviaResult,
};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, Utc};

/// Hours of history covered by `/api/status`
const STATUS_WINDOW_HOURS: i64 = 24;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/test", get(liveness))
        .route("/api/status", get(probe_status))
}

/// GET /api/test
pub async fn liveness() -> &'static str {
    "API is working!"
}

/// GET /api/status
///
/// Probe results of the last day in 15-minute buckets, newest first.
pub async fn probe_status(State(ctx): State<AppContext>) -> OctaviaResult<Json<Vec<StatusDataPoint>>> {
    let since = (Utc::now() - Duration::hours(STATUS_WINDOW_HOURS)).timestamp_millis();
    let points = ctx.probe_store.since(since).await?;

    Ok(Json(aggregate_buckets(&points)))
}

/// Stage lookup endpoint
use crate::{
    context::AppContext,
    error::{OctaviaError, OctaviaResult},
    stage::StageInfo,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/stage", get(get_stage))
}

#[derive(Debug, Deserialize)]
pub struct StageParams {
    pub region: Option<String>,
    pub id: Option<String>,
}

/// GET /api/stage?region=<region>&id=<stageId>
pub async fn get_stage(
    State(ctx): State<AppContext>,
    Query(params): Query<StageParams>,
) -> OctaviaResult<Json<StageInfo>> {
    let region = params.region.unwrap_or_default();
    let id = params
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| OctaviaError::Validation("Missing stage id".to_string()))?;

    let info = ctx.stage_service.get_stage_info(region.trim(), &id).await?;

    Ok(Json(info))
}

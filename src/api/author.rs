/// Author lookup endpoint
use crate::{author::AuthorInfo, context::AppContext, error::OctaviaResult};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/author", get(get_author))
}

#[derive(Debug, Deserialize)]
pub struct AuthorParams {
    pub id: Option<String>,
}

/// GET /api/author?id=<uid>
///
/// A missing id is handled like the empty sentinel.
pub async fn get_author(
    State(ctx): State<AppContext>,
    Query(params): Query<AuthorParams>,
) -> OctaviaResult<Json<AuthorInfo>> {
    let id = params.id.unwrap_or_default();
    let info = ctx.author_service.get_author_info(&id).await?;

    Ok(Json(info))
}

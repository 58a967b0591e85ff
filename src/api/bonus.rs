/// Key-value lookup endpoint
use crate::context::AppContext;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/bonus", get(get_bonus))
}

#[derive(Debug, Deserialize)]
pub struct BonusParams {
    pub hash: Option<String>,
}

/// GET /api/bonus?hash=<key>
///
/// Plain-text value, empty when absent or when the store is unavailable.
pub async fn get_bonus(State(ctx): State<AppContext>, Query(params): Query<BonusParams>) -> String {
    let Some(hash) = params.hash.filter(|h| !h.is_empty()) else {
        return String::new();
    };

    match ctx.bonus_store.get(&hash).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Bonus lookup failed");
            String::new()
        }
    }
}

/// Region metadata document consumed by the front-end
use crate::{context::AppContext, stage::Region};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/data/regions.json", get(regions))
}

#[derive(Debug, Serialize)]
pub struct RegionInfo {
    pub name: &'static str,
    /// Base URL of the platform's stage page
    pub stage: &'static str,
    /// Base URL of the platform's account page
    pub author: &'static str,
}

/// Metadata for every known region, keyed by region id
pub fn region_map() -> BTreeMap<&'static str, RegionInfo> {
    Region::ALL
        .iter()
        .map(|region| {
            (
                region.as_str(),
                RegionInfo {
                    name: region.display_name(),
                    stage: region.stage_link_base(),
                    author: region.author_link_base(),
                },
            )
        })
        .collect()
}

/// GET /data/regions.json
pub async fn regions() -> Json<BTreeMap<&'static str, RegionInfo>> {
    Json(region_map())
}

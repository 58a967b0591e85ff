/// Read-through stage cache with stale fallback
use super::{inflight::InFlight, CacheStatus, CanonicalStage, Region, StageInfo, StageRecord};
use crate::{
    db::{AuthorRecord, AuthorStore, StageStore},
    error::OctaviaResult,
    metrics,
    upstream::{FetchError, StageSource},
};
use chrono::Utc;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default freshness window of a cached stage
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Stage lookups through the cache
pub struct StageService {
    stages: StageStore,
    authors: AuthorStore,
    source: Arc<dyn StageSource>,
    ttl_secs: i64,
    in_flight: InFlight,
}

impl StageService {
    pub fn new(stages: StageStore, authors: AuthorStore, source: Arc<dyn StageSource>, ttl: Duration) -> Self {
        Self {
            stages,
            authors,
            source,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            in_flight: InFlight::new(),
        }
    }

    /// Resolve a stage by raw region string.
    ///
    /// Unknown regions are rejected before any store or network access.
    pub async fn get_stage_info(&self, region: &str, stage_id: &str) -> OctaviaResult<StageInfo> {
        let region: Region = region.parse()?;
        self.get(region, stage_id).await
    }

    /// Resolve a stage.
    ///
    /// Resolution order:
    /// 1. Fresh cache row (no upstream call)
    /// 2. Upstream fetch, persisted on success
    /// 3. Last cached copy when upstream reports the stage removed or fails
    pub async fn get(&self, region: Region, stage_id: &str) -> OctaviaResult<StageInfo> {
        let cached = self.lookup(region, stage_id).await;

        if let Some((record, stage)) = &cached {
            if record.is_fresh(Utc::now().timestamp()) {
                metrics::record_cache_access("stage", true);
                return Ok(StageInfo {
                    stage: stage.clone(),
                    status: CacheStatus::fresh(),
                });
            }
        }
        metrics::record_cache_access("stage", false);

        match self.fetch(region, stage_id).await {
            Ok(stage) => {
                self.persist(region, stage_id, &stage).await;
                Ok(StageInfo {
                    stage,
                    status: CacheStatus::fetched(),
                })
            }
            Err(err) => match cached {
                Some((_, stage)) => {
                    let status = match &err {
                        FetchError::NotFound(_) => {
                            warn!(%region, stage_id, error = %err, "Stage removed upstream, serving cached copy");
                            metrics::record_stale_serve("removed");
                            CacheStatus::removed()
                        }
                        FetchError::Upstream(_) => {
                            warn!(%region, stage_id, error = %err, "Upstream unavailable, serving stale copy");
                            metrics::record_stale_serve("upstream_error");
                            CacheStatus::stale()
                        }
                    };
                    Ok(StageInfo { stage, status })
                }
                None => {
                    debug!(%region, stage_id, upstream = false, "No cached copy to fall back on");
                    Err(err.into())
                }
            },
        }
    }

    /// Cached row and its decoded payload; store or decode failures count as a miss
    async fn lookup(&self, region: Region, stage_id: &str) -> Option<(StageRecord, CanonicalStage)> {
        let record = match self.stages.get(region, stage_id).await {
            Ok(record) => record?,
            Err(e) => {
                warn!(%region, stage_id, error = %e, "Stage cache lookup failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CanonicalStage>(&record.data) {
            Ok(stage) => Some((record, stage)),
            Err(e) => {
                warn!(%region, stage_id, error = %e, "Cached stage payload unreadable, treating as miss");
                None
            }
        }
    }

    async fn fetch(&self, region: Region, stage_id: &str) -> Result<CanonicalStage, FetchError> {
        let source = Arc::clone(&self.source);
        let id = stage_id.to_string();
        self.in_flight
            .run(region, stage_id, move || {
                async move { source.fetch_stage(region, &id).await }.boxed()
            })
            .await
    }

    /// Write the stage row and its author; failures are logged and dropped
    async fn persist(&self, region: Region, stage_id: &str, stage: &CanonicalStage) {
        let data = match serde_json::to_string(stage) {
            Ok(data) => data,
            Err(e) => {
                warn!(%region, stage_id, error = %e, "Failed to serialize stage payload");
                return;
            }
        };

        let now = Utc::now().timestamp();
        let record = StageRecord {
            region,
            stage_id: stage_id.to_string(),
            uid: stage.author.uid(),
            data,
            created_at: now,
            expires_at: now.saturating_add(self.ttl_secs),
        };
        if let Err(e) = self.stages.upsert(&record).await {
            warn!(%region, stage_id, error = %e, "Failed to persist stage cache");
        }

        if let Some(author) = AuthorRecord::from_stage_author(&stage.author) {
            if let Err(e) = self.authors.upsert(&author).await {
                warn!(uid = %author.uid, error = %e, "Failed to persist author");
            }
        }
    }
}

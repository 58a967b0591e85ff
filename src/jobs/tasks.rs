/// Background task implementations
use crate::{context::AppContext, db::ProbeDatapoint, error::OctaviaResult, metrics};
use chrono::Utc;
use std::time::Instant;

const MS_PER_DAY: i64 = 86_400_000;

/// Probe each configured stage once, sequentially, through the upstream client.
///
/// The cache is bypassed so every datapoint reflects a real upstream call.
pub async fn run_probes(ctx: &AppContext) -> Vec<ProbeDatapoint> {
    let mut results = Vec::with_capacity(ctx.config.probe.targets.len());

    for target in &ctx.config.probe.targets {
        let recorded_at = Utc::now().timestamp_millis();
        let started = Instant::now();
        let outcome = ctx.upstream.fetch_stage(target.region, &target.stage_id).await;
        let elapsed = started.elapsed().as_secs_f64();

        let point = ProbeDatapoint {
            probe_key: target.key(),
            recorded_at,
            duration_ms: elapsed * 1000.0,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        };

        metrics::record_probe(&point.probe_key, point.success, elapsed);
        if let Some(err) = &point.error {
            tracing::warn!(probe = %point.probe_key, error = %err, "Probe failed");
        }
        if let Err(e) = ctx.probe_store.record(&point).await {
            tracing::warn!(probe = %point.probe_key, error = %e, "Failed to record probe datapoint");
        }

        results.push(point);
    }

    results
}

/// Delete probe datapoints past the retention window
pub async fn purge_probe_metrics(ctx: &AppContext) -> OctaviaResult<u64> {
    let retention_ms = i64::try_from(ctx.config.probe.retention_days)
        .unwrap_or(i64::MAX)
        .saturating_mul(MS_PER_DAY);
    let cutoff = Utc::now().timestamp_millis().saturating_sub(retention_ms);
    ctx.probe_store.purge_before(cutoff).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProbeTarget, ServerConfig};
    use crate::db::open_memory;
    use crate::stage::{CanonicalStage, Level, LevelMeta, LevelVersion, Region, StageAuthor};
    use crate::upstream::{FetchError, StageSource};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Fails for stage "bad", succeeds otherwise
    struct ProbeSource;

    #[async_trait]
    impl StageSource for ProbeSource {
        async fn fetch_stage(&self, region: Region, stage_id: &str) -> Result<CanonicalStage, FetchError> {
            if stage_id == "bad" {
                return Err(FetchError::Upstream("timeout".to_string()));
            }
            Ok(CanonicalStage {
                level: Level {
                    id: stage_id.to_string(),
                    region,
                    meta: LevelMeta::default(),
                    version: LevelVersion::default(),
                },
                author: StageAuthor::default(),
            })
        }
    }

    async fn context(targets: Vec<ProbeTarget>) -> AppContext {
        let mut config = ServerConfig::default();
        config.probe.targets = targets;
        AppContext::with_source(config, open_memory().await.unwrap(), Arc::new(ProbeSource))
    }

    #[tokio::test]
    async fn test_run_probes_records_each_target() {
        let ctx = context(vec![
            ProbeTarget {
                region: Region::CnGf01,
                stage_id: "good".to_string(),
            },
            ProbeTarget {
                region: Region::OsAsia,
                stage_id: "bad".to_string(),
            },
        ])
        .await;

        let results = run_probes(&ctx).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);

        let stored = ctx.probe_store.since(0).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].probe_key, "cn_gf01:good");
        assert_eq!(stored[1].probe_key, "os_asia:bad");
        assert!(stored[1].error.as_deref().unwrap().contains("timeout"));

        // Probes never populate the stage cache
        let cached = ctx.stage_service.get(Region::CnGf01, "good").await.unwrap();
        assert!(!cached.status.cache);
    }

    #[tokio::test]
    async fn test_purge_keeps_recent_points() {
        let ctx = context(Vec::new()).await;
        let now = Utc::now().timestamp_millis();

        for recorded_at in [0, now] {
            ctx.probe_store
                .record(&ProbeDatapoint {
                    probe_key: "cn_gf01:1".to_string(),
                    recorded_at,
                    duration_ms: 10.0,
                    success: true,
                    error: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(purge_probe_metrics(&ctx).await.unwrap(), 1);
        assert_eq!(ctx.probe_store.since(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_with_huge_retention_keeps_everything() {
        let mut config = ServerConfig::default();
        config.probe.retention_days = u64::MAX;
        let ctx = AppContext::with_source(config, open_memory().await.unwrap(), Arc::new(ProbeSource));

        ctx.probe_store
            .record(&ProbeDatapoint {
                probe_key: "cn_gf01:1".to_string(),
                recorded_at: 0,
                duration_ms: 10.0,
                success: true,
                error: None,
            })
            .await
            .unwrap();

        assert_eq!(purge_probe_metrics(&ctx).await.unwrap(), 0);
        assert_eq!(ctx.probe_store.since(0).await.unwrap().len(), 1);
    }
}

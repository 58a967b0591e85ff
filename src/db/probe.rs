/// Probe metric sink and status aggregation
use crate::error::OctaviaResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;

/// Width of one status bucket
pub const BUCKET_MS: i64 = 15 * 60 * 1000;

/// One probe result
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProbeDatapoint {
    /// `region:stageId`
    pub probe_key: String,
    /// Unix timestamp in milliseconds
    pub recorded_at: i64,
    pub duration_ms: f64,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregated probe statistics for one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDataPoint {
    /// Bucket start, Unix milliseconds
    pub timestamp: i64,
    /// Bucket start, RFC 3339
    pub time_group: String,
    pub min_duration: f64,
    pub max_duration: f64,
    pub avg_duration: f64,
    pub std_dev: f64,
    pub success_rate: f64,
    pub count: u64,
}

/// `probe_metric` table manager
#[derive(Clone)]
pub struct ProbeStore {
    db: SqlitePool,
}

impl ProbeStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append one datapoint
    pub async fn record(&self, point: &ProbeDatapoint) -> OctaviaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO probe_metric (probe_key, recorded_at, duration_ms, success, error)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&point.probe_key)
        .bind(point.recorded_at)
        .bind(point.duration_ms)
        .bind(point.success)
        .bind(&point.error)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Datapoints recorded at or after `since_ms`, oldest first
    pub async fn since(&self, since_ms: i64) -> OctaviaResult<Vec<ProbeDatapoint>> {
        let points = sqlx::query_as::<_, ProbeDatapoint>(
            r#"
            SELECT probe_key, recorded_at, duration_ms, success, error
            FROM probe_metric
            WHERE recorded_at >= ?1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(since_ms)
        .fetch_all(&self.db)
        .await?;

        Ok(points)
    }

    /// Delete datapoints recorded before `cutoff_ms`
    pub async fn purge_before(&self, cutoff_ms: i64) -> OctaviaResult<u64> {
        let result = sqlx::query("DELETE FROM probe_metric WHERE recorded_at < ?1")
            .bind(cutoff_ms)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Group datapoints into 15-minute buckets, newest bucket first
pub fn aggregate_buckets(points: &[ProbeDatapoint]) -> Vec<StatusDataPoint> {
    let mut buckets: BTreeMap<i64, Vec<&ProbeDatapoint>> = BTreeMap::new();
    for point in points {
        let start = point.recorded_at.div_euclid(BUCKET_MS) * BUCKET_MS;
        buckets.entry(start).or_default().push(point);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(start, points)| {
            let count = points.len() as f64;
            let durations: Vec<f64> = points.iter().map(|p| p.duration_ms).collect();
            let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
            let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = durations.iter().sum::<f64>() / count;
            let variance = durations.iter().map(|d| (d - avg).powi(2)).sum::<f64>() / count;
            let successes = points.iter().filter(|p| p.success).count() as f64;

            StatusDataPoint {
                timestamp: start,
                time_group: DateTime::<Utc>::from_timestamp_millis(start)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                min_duration: min,
                max_duration: max,
                avg_duration: avg,
                std_dev: variance.sqrt(),
                success_rate: successes / count,
                count: points.len() as u64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;

    fn point(recorded_at: i64, duration_ms: f64, success: bool) -> ProbeDatapoint {
        ProbeDatapoint {
            probe_key: "cn_gf01:1".to_string(),
            recorded_at,
            duration_ms,
            success,
            error: (!success).then(|| "timeout".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_since_and_purge() {
        let store = ProbeStore::new(open_memory().await.unwrap());

        store.record(&point(1_000, 120.0, true)).await.unwrap();
        store.record(&point(5_000, 80.0, false)).await.unwrap();

        let all = store.since(0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].error.as_deref(), Some("timeout"));
        assert!(!all[1].success);

        assert_eq!(store.since(2_000).await.unwrap().len(), 1);
        assert_eq!(store.purge_before(2_000).await.unwrap(), 1);
        assert_eq!(store.since(0).await.unwrap().len(), 1);
    }

    #[test]
    fn test_aggregate_buckets() {
        let points = vec![
            point(0, 100.0, true),
            point(60_000, 300.0, false),
            point(BUCKET_MS + 1, 50.0, true),
        ];

        let buckets = aggregate_buckets(&points);
        assert_eq!(buckets.len(), 2);

        // Newest first
        assert_eq!(buckets[0].timestamp, BUCKET_MS);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].std_dev, 0.0);

        let first = &buckets[1];
        assert_eq!(first.timestamp, 0);
        assert_eq!(first.time_group, "1970-01-01T00:00:00+00:00");
        assert_eq!(first.min_duration, 100.0);
        assert_eq!(first.max_duration, 300.0);
        assert_eq!(first.avg_duration, 200.0);
        assert_eq!(first.std_dev, 100.0);
        assert_eq!(first.success_rate, 0.5);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_buckets(&[]).is_empty());
    }
}

/// Stage cache table access
use crate::{
    error::{OctaviaError, OctaviaResult},
    stage::{Region, StageRecord, StageRef},
};
use sqlx::{Row, SqlitePool};

/// `stage_cache` table manager
#[derive(Clone)]
pub struct StageStore {
    db: SqlitePool,
}

impl StageStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get the cached row for a stage, fresh or not
    pub async fn get(&self, region: Region, stage_id: &str) -> OctaviaResult<Option<StageRecord>> {
        let row = sqlx::query(
            r#"
            SELECT region, stage_id, uid, data, created_at, expires_at
            FROM stage_cache
            WHERE region = ?1 AND stage_id = ?2
            "#,
        )
        .bind(region.as_str())
        .bind(stage_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let region: Region = row
            .try_get::<String, _>("region")?
            .parse()
            .map_err(|e: OctaviaError| OctaviaError::Internal(e.to_string()))?;

        Ok(Some(StageRecord {
            region,
            stage_id: row.try_get("stage_id")?,
            uid: row.try_get("uid")?,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        }))
    }

    /// Insert or replace the row for a stage.
    ///
    /// An existing row keeps its `created_at`; `record.created_at` only
    /// applies to new rows.
    pub async fn upsert(&self, record: &StageRecord) -> OctaviaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stage_cache (region, stage_id, uid, data, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(region, stage_id) DO UPDATE SET
                uid = excluded.uid,
                data = excluded.data,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(record.region.as_str())
        .bind(&record.stage_id)
        .bind(&record.uid)
        .bind(&record.data)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Stages attributed to an author, most recently first seen first
    pub async fn list_for_uid(&self, uid: &str) -> OctaviaResult<Vec<StageRef>> {
        let rows = sqlx::query(
            r#"
            SELECT region, stage_id
            FROM stage_cache
            WHERE uid = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(uid)
        .fetch_all(&self.db)
        .await?;

        rows.iter()
            .map(|row| -> OctaviaResult<StageRef> {
                Ok(StageRef {
                    region: row.try_get("region")?,
                    stage_id: row.try_get("stage_id")?,
                })
            })
            .collect()
    }
}

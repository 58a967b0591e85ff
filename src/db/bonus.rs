/// Key-value lookups behind `/api/bonus`
use crate::error::OctaviaResult;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct BonusStore {
    db: SqlitePool,
}

impl BonusStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn get(&self, hash: &str) -> OctaviaResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM bonus WHERE hash = ?1")
            .bind(hash)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    pub async fn put(&self, hash: &str, value: &str) -> OctaviaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bonus (hash, value) VALUES (?1, ?2)
            ON CONFLICT(hash) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(hash)
        .bind(value)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

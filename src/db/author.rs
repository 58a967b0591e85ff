/// Author table models and operations
use crate::{
    error::OctaviaResult,
    stage::{StageAuthor, HYL_UID_PREFIX},
    upstream::{sanitize_avatar, DEFAULT_AVATAR},
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Author record in the database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub uid: String,
    pub avatar: Option<String>,
    pub name: Option<String>,
    pub ingame_name: Option<String>,
    /// Only ever set for platform-B authors
    pub pendant: Option<String>,
}

impl AuthorRecord {
    /// Build the record for a stage author, if the author has a linkable uid.
    ///
    /// Avatar preference: platform avatar, then in-game avatar, then the
    /// default image. Placeholder images are stored as null.
    pub fn from_stage_author(author: &StageAuthor) -> Option<Self> {
        let uid = author.uid()?;
        let is_hyl = uid.starts_with(HYL_UID_PREFIX);

        let (platform_avatar, platform_name, pendant) = if is_hyl {
            let hyl = author.hyl.as_ref();
            (
                hyl.and_then(|h| h.avatar.clone()),
                hyl.and_then(|h| h.name.clone()),
                hyl.and_then(|h| h.pendant.clone()),
            )
        } else {
            let mys = author.mys.as_ref();
            (
                mys.and_then(|m| m.avatar.clone()),
                mys.and_then(|m| m.name.clone()),
                None,
            )
        };

        let avatar = sanitize_avatar(platform_avatar)
            .or_else(|| sanitize_avatar(author.game.avatar.clone()))
            .or_else(|| Some(DEFAULT_AVATAR.to_string()));

        Some(Self {
            uid,
            avatar: sanitize_avatar(avatar),
            name: platform_name,
            ingame_name: author.game.name.clone(),
            pendant,
        })
    }
}

/// `author` table manager
#[derive(Clone)]
pub struct AuthorStore {
    db: SqlitePool,
}

impl AuthorStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get an author by exact uid
    pub async fn get(&self, uid: &str) -> OctaviaResult<Option<AuthorRecord>> {
        let author = sqlx::query_as::<_, AuthorRecord>(
            "SELECT uid, avatar, name, ingame_name, pendant FROM author WHERE uid = ?1",
        )
        .bind(uid)
        .fetch_optional(&self.db)
        .await?;

        Ok(author)
    }

    /// Insert or replace an author
    pub async fn upsert(&self, author: &AuthorRecord) -> OctaviaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO author (uid, avatar, name, ingame_name, pendant)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(uid) DO UPDATE SET
                avatar = excluded.avatar,
                name = excluded.name,
                ingame_name = excluded.ingame_name,
                pendant = excluded.pendant
            "#,
        )
        .bind(&author.uid)
        .bind(&author.avatar)
        .bind(&author.name)
        .bind(&author.ingame_name)
        .bind(&author.pendant)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

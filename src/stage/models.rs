/// Canonical stage shape shared by the cache, the API and the front-end
use super::Region;
use serde::{Deserialize, Serialize};

/// Normalized stage payload, persisted as JSON text in `stage_cache.data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStage {
    pub level: Level,
    pub author: StageAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub region: Region,
    pub meta: LevelMeta,
    pub version: LevelVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelMeta {
    pub name: String,
    pub description: String,
    pub intro: String,
    #[serde(rename = "type")]
    pub level_type: String,
    pub category: String,
    pub tags: Vec<String>,
    pub players: Players,
    pub hot_score: String,
    pub good_rate: String,
    pub cover: Cover,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Players {
    pub min: u32,
    pub max: u32,
    /// Platform-formatted player count, e.g. "1-4"
    #[serde(rename = "str", alias = "displayString")]
    pub display_string: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cover {
    pub images: Vec<String>,
    pub video_cover: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelVersion {
    pub latest: Option<String>,
    pub update_info: Option<String>,
    pub changelog: Vec<ChangelogEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogEntry {
    pub version: String,
    pub content: String,
}

/// Author identities attached to a stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageAuthor {
    pub game: GameIdentity,
    pub mys: Option<MysIdentity>,
    pub hyl: Option<HylIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameIdentity {
    pub avatar: Option<String>,
    pub name: Option<String>,
}

/// Platform-A (miyoushe) account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MysIdentity {
    pub aid: String,
    pub avatar: Option<String>,
    pub name: Option<String>,
}

/// Platform-B (hoyolab) account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HylIdentity {
    pub aid: String,
    pub avatar: Option<String>,
    pub pendant: Option<String>,
    pub name: Option<String>,
}

/// Prefix marking a platform-A derived uid
pub const MYS_UID_PREFIX: char = 'm';
/// Prefix marking a platform-B derived uid
pub const HYL_UID_PREFIX: char = 'h';

impl StageAuthor {
    /// Normalized author uid: `m<aid>` for platform-A, else `h<aid>` for
    /// platform-B, else none.
    pub fn uid(&self) -> Option<String> {
        if let Some(mys) = self.mys.as_ref().filter(|m| !m.aid.is_empty()) {
            return Some(format!("{}{}", MYS_UID_PREFIX, mys.aid));
        }
        self.hyl
            .as_ref()
            .filter(|h| !h.aid.is_empty())
            .map(|h| format!("{}{}", HYL_UID_PREFIX, h.aid))
    }
}

/// Per-request cache outcome, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub cache: bool,
    pub upstream: Option<bool>,
    pub removed: Option<bool>,
}

impl CacheStatus {
    /// Served from a fresh cache row
    pub fn fresh() -> Self {
        Self {
            cache: true,
            upstream: None,
            removed: None,
        }
    }

    /// Fetched from upstream this call
    pub fn fetched() -> Self {
        Self {
            cache: false,
            upstream: Some(true),
            removed: Some(false),
        }
    }

    /// Upstream reports the stage gone; last known copy served
    pub fn removed() -> Self {
        Self {
            cache: true,
            upstream: None,
            removed: Some(true),
        }
    }

    /// Upstream failed; expired copy served
    pub fn stale() -> Self {
        Self {
            cache: true,
            upstream: Some(false),
            removed: None,
        }
    }
}

/// Canonical payload with its cache status attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    #[serde(flatten)]
    pub stage: CanonicalStage,
    pub status: CacheStatus,
}

/// Row of the `stage_cache` table
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub region: Region,
    pub stage_id: String,
    pub uid: Option<String>,
    /// JSON-encoded [`CanonicalStage`]
    pub data: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl StageRecord {
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

/// Reference to a stage in an author's stage list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub region: String,
    pub stage_id: String,
}

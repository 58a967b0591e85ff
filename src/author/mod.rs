/// Author lookup by platform-prefixed uid
use crate::{
    db::{AuthorRecord, AuthorStore, StageStore},
    error::{OctaviaError, OctaviaResult},
    stage::{StageRef, HYL_UID_PREFIX, MYS_UID_PREFIX},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inputs that front-ends send when no author is linked
const SENTINEL_IDS: [&str; 4] = ["", "0", "null", "undefined"];

/// Author profile plus the stages seen for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub uid: String,
    pub avatar: Option<String>,
    pub name: Option<String>,
    pub ingame_name: Option<String>,
    pub pendant: Option<String>,
    pub stages: Vec<StageRef>,
}

/// Candidate uids for a raw author id, in lookup order
pub fn candidate_uids(raw_id: &str) -> OctaviaResult<Vec<String>> {
    let id = raw_id.trim();
    if SENTINEL_IDS.contains(&id) {
        return Err(OctaviaError::InvalidAuthorId(raw_id.to_string()));
    }

    if id.starts_with(MYS_UID_PREFIX) || id.starts_with(HYL_UID_PREFIX) {
        Ok(vec![id.to_string()])
    } else {
        Ok(vec![
            format!("{}{}", MYS_UID_PREFIX, id),
            format!("{}{}", HYL_UID_PREFIX, id),
        ])
    }
}

/// Author lookups against the store
#[derive(Clone)]
pub struct AuthorService {
    authors: AuthorStore,
    stages: StageStore,
}

impl AuthorService {
    pub fn new(authors: AuthorStore, stages: StageStore) -> Self {
        Self { authors, stages }
    }

    /// Resolve an author and list their known stages, newest first.
    ///
    /// Unprefixed ids try platform-A first, then platform-B.
    pub async fn get_author_info(&self, raw_id: &str) -> OctaviaResult<AuthorInfo> {
        let mut author = None;
        for uid in candidate_uids(raw_id)? {
            if let Some(found) = self.find(&uid).await {
                author = Some(found);
                break;
            }
        }
        let author = author.ok_or_else(|| OctaviaError::AuthorNotFound(raw_id.trim().to_string()))?;

        let stages = self.stages.list_for_uid(&author.uid).await.unwrap_or_else(|e| {
            warn!(uid = %author.uid, error = %e, "Failed to list author stages");
            Vec::new()
        });

        let AuthorRecord {
            uid,
            avatar,
            name,
            ingame_name,
            pendant,
        } = author;

        Ok(AuthorInfo {
            uid,
            avatar,
            name,
            ingame_name,
            pendant,
            stages,
        })
    }

    /// Store failures read as "not found"
    async fn find(&self, uid: &str) -> Option<AuthorRecord> {
        self.authors.get(uid).await.unwrap_or_else(|e| {
            warn!(uid, error = %e, "Author lookup failed");
            None
        })
    }
}

/// Upstream platform access
///
/// Issues the aggregated `level/full/info` request and normalizes the
/// heterogeneous response into a [`CanonicalStage`].

pub mod client;
pub mod normalize;

pub use client::{UpstreamClient, UpstreamConfig};
pub use normalize::{normalize_full_info, sanitize_avatar, DEFAULT_AVATAR, HYL_PLACEHOLDER_AVATAR, MYS_PLACEHOLDER_AVATAR};

use crate::stage::{CanonicalStage, Region};
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a failed upstream fetch
///
/// Cloneable so coalesced callers can share a single result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Stage removed or unpublished; not transient
    #[error("stage not found: {0}")]
    NotFound(String),

    /// Transport, timeout, status or decoding failure; transient
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Source of canonical stage data
#[async_trait]
pub trait StageSource: Send + Sync {
    /// Fetch and normalize one stage
    async fn fetch_stage(&self, region: Region, stage_id: &str) -> Result<CanonicalStage, FetchError>;
}

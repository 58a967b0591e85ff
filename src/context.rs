/// Application context and dependency injection
use crate::{
    author::AuthorService,
    config::ServerConfig,
    db::{self, AuthorStore, BonusStore, DatabaseOptions, ProbeStore, StageStore},
    error::OctaviaResult,
    rate_limit::RateLimiter,
    stage::StageService,
    upstream::{StageSource, UpstreamClient, UpstreamConfig},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
///
/// Passed explicitly to every handler and job; there is no global state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub upstream: Arc<dyn StageSource>,
    pub stage_service: Arc<StageService>,
    pub author_service: Arc<AuthorService>,
    pub bonus_store: BonusStore,
    pub probe_store: ProbeStore,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> OctaviaResult<Self> {
        // Validate configuration
        config.validate()?;

        let db = db::open(&config.storage.database, DatabaseOptions::default()).await?;

        let upstream = Arc::new(UpstreamClient::new(UpstreamConfig {
            user_agent: config.upstream.user_agent.clone(),
            timeout: config.upstream_timeout(),
            cn_base_url: config.upstream.cn_base_url.clone(),
            os_base_url: config.upstream.os_base_url.clone(),
        })?);

        Ok(Self::with_source(config, db, upstream))
    }

    /// Assemble the context around an existing pool and stage source
    pub fn with_source(config: ServerConfig, db: SqlitePool, upstream: Arc<dyn StageSource>) -> Self {
        let stage_store = StageStore::new(db.clone());
        let author_store = AuthorStore::new(db.clone());

        let stage_service = Arc::new(StageService::new(
            stage_store.clone(),
            author_store.clone(),
            Arc::clone(&upstream),
            config.cache_ttl(),
        ));
        let author_service = Arc::new(AuthorService::new(author_store, stage_store));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config: Arc::new(config),
            bonus_store: BonusStore::new(db.clone()),
            probe_store: ProbeStore::new(db),
            upstream,
            stage_service,
            author_service,
            rate_limiter,
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

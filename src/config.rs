/// Configuration management for Octavia
use crate::error::{OctaviaError, OctaviaResult};
use crate::stage::Region;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "octavia=debug,tower_http=debug";

/// Upper bound for day-based retention windows
pub const MAX_RETENTION_DAYS: u64 = 3650;

/// Upper bound for the cache TTL (ten years)
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 86400;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub upstream: UpstreamSettings,
    pub cache: CacheConfig,
    pub probe: ProbeConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Front-end assets served for non-API paths
    pub static_dir: Option<PathBuf>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file, or `:memory:`
    pub database: PathBuf,
}

/// Third-party platform access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cn_base_url: String,
    pub os_base_url: String,
}

/// Stage cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

/// One stage checked by the scheduled probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub region: Region,
    pub stage_id: String,
}

impl ProbeTarget {
    /// Composite key tag stored with each datapoint
    pub fn key(&self) -> String {
        format!("{}:{}", self.region, self.stage_id)
    }
}

/// Scheduled health-check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub retention_days: u64,
    pub targets: Vec<ProbeTarget>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 8787,
                static_dir: None,
            },
            storage: StorageConfig {
                database: PathBuf::from("./data/octavia.sqlite"),
            },
            upstream: UpstreamSettings {
                user_agent: "Octavia/0.0.1 (kj415j45/octavia)".to_string(),
                timeout_secs: 3,
                cn_base_url: "https://bbs-api.miyoushe.com".to_string(),
                os_base_url: "https://bbs-api-os.hoyolab.com".to_string(),
            },
            cache: CacheConfig { ttl_secs: 3600 },
            probe: ProbeConfig {
                enabled: true,
                interval_secs: 900,
                retention_days: 7,
                targets: Vec::new(),
            },
            rate_limit: RateLimitSettings {
                enabled: true,
                requests_per_second: 50,
                burst_size: 100,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
                json: false,
            },
        }
    }
}

/// Parse `region:stageId` entries separated by commas
pub fn parse_probe_targets(raw: &str) -> OctaviaResult<Vec<ProbeTarget>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (region, stage_id) = entry.split_once(':').ok_or_else(|| {
                OctaviaError::Validation(format!("Probe target must be region:stageId, got {}", entry))
            })?;
            let stage_id = stage_id.trim();
            if stage_id.is_empty() {
                return Err(OctaviaError::Validation(format!("Probe target {} has no stage id", entry)));
            }
            Ok(ProbeTarget {
                region: region.trim().parse()?,
                stage_id: stage_id.to_string(),
            })
        })
        .collect()
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> OctaviaResult<Self> {
        dotenv::dotenv().ok();
        let defaults = ServerConfig::default();

        let hostname = env::var("OCTAVIA_HOST").unwrap_or(defaults.service.hostname);
        let port = env::var("OCTAVIA_PORT")
            .unwrap_or_else(|_| defaults.service.port.to_string())
            .parse()
            .map_err(|_| OctaviaError::Validation("Invalid port number".to_string()))?;
        let static_dir = env::var("OCTAVIA_STATIC_DIR").ok().map(PathBuf::from);

        let database = env::var("OCTAVIA_DATABASE")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.database);

        let upstream = UpstreamSettings {
            user_agent: env::var("OCTAVIA_USER_AGENT").unwrap_or(defaults.upstream.user_agent),
            timeout_secs: env_or("OCTAVIA_UPSTREAM_TIMEOUT_SECS", defaults.upstream.timeout_secs),
            cn_base_url: env::var("OCTAVIA_UPSTREAM_CN_URL").unwrap_or(defaults.upstream.cn_base_url),
            os_base_url: env::var("OCTAVIA_UPSTREAM_OS_URL").unwrap_or(defaults.upstream.os_base_url),
        };

        let targets = match env::var("OCTAVIA_PROBE_STAGES") {
            Ok(raw) => parse_probe_targets(&raw)?,
            Err(_) => Vec::new(),
        };
        let probe = ProbeConfig {
            enabled: env_or("OCTAVIA_PROBE_ENABLED", defaults.probe.enabled),
            interval_secs: env_or("OCTAVIA_PROBE_INTERVAL_SECS", defaults.probe.interval_secs),
            retention_days: env_or("OCTAVIA_PROBE_RETENTION_DAYS", defaults.probe.retention_days),
            targets,
        };

        let rate_limit = RateLimitSettings {
            enabled: env_or("OCTAVIA_RATE_LIMIT_ENABLED", defaults.rate_limit.enabled),
            requests_per_second: env_or("OCTAVIA_RATE_LIMIT_RPS", defaults.rate_limit.requests_per_second),
            burst_size: env_or("OCTAVIA_RATE_LIMIT_BURST", defaults.rate_limit.burst_size),
        };

        let logging = LoggingConfig {
            level: env::var("RUST_LOG").unwrap_or(defaults.logging.level),
            json: env::var("OCTAVIA_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                static_dir,
            },
            storage: StorageConfig { database },
            upstream,
            cache: CacheConfig {
                ttl_secs: env_or("OCTAVIA_CACHE_TTL_SECS", defaults.cache.ttl_secs),
            },
            probe,
            rate_limit,
            logging,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> OctaviaResult<()> {
        if self.service.hostname.is_empty() {
            return Err(OctaviaError::Validation("Hostname cannot be empty".to_string()));
        }
        if self.service.port == 0 {
            return Err(OctaviaError::Validation("Port cannot be 0".to_string()));
        }
        if self.upstream.user_agent.trim().is_empty() {
            return Err(OctaviaError::Validation("User agent cannot be empty".to_string()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(OctaviaError::Validation("Upstream timeout must be positive".to_string()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(OctaviaError::Validation("Cache TTL must be positive".to_string()));
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(OctaviaError::Validation(format!(
                "Cache TTL cannot exceed {} seconds",
                MAX_CACHE_TTL_SECS
            )));
        }
        if self.probe.retention_days > MAX_RETENTION_DAYS {
            return Err(OctaviaError::Validation(format!(
                "Probe retention cannot exceed {} days",
                MAX_RETENTION_DAYS
            )));
        }
        if self.probe.enabled && self.probe.interval_secs == 0 {
            return Err(OctaviaError::Validation("Probe interval must be positive".to_string()));
        }

        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.upstream_timeout(), Duration::from_secs(3));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_probe_targets() {
        let targets = parse_probe_targets(" cn_gf01:123 , os_usa:456,").unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].key(), "cn_gf01:123");
        assert_eq!(targets[1].region, Region::OsUsa);
    }

    #[test]
    fn test_parse_probe_targets_rejects_malformed() {
        assert!(matches!(
            parse_probe_targets("xx_zz99:1"),
            Err(OctaviaError::InvalidRegion { .. })
        ));
        assert!(parse_probe_targets("cn_gf01").is_err());
        assert!(parse_probe_targets("cn_gf01:").is_err());
        assert!(parse_probe_targets("").unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = ServerConfig::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_ttl_and_retention() {
        let mut config = ServerConfig::default();
        config.cache.ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(OctaviaError::Validation(_))));

        let mut config = ServerConfig::default();
        config.probe.retention_days = u64::MAX;
        assert!(matches!(config.validate(), Err(OctaviaError::Validation(_))));

        let mut config = ServerConfig::default();
        config.cache.ttl_secs = MAX_CACHE_TTL_SECS;
        config.probe.retention_days = MAX_RETENTION_DAYS;
        config.validate().unwrap();
    }

    #[test]
    fn test_default_log_filter_parses() {
        let config = ServerConfig::default();
        assert_eq!(config.logging.level, DEFAULT_LOG_FILTER);
        assert!(tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_ok());
    }
}

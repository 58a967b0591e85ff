/// HTTP client for the third-party stage platform
use super::{
    normalize::{normalize_full_info, Envelope, FullInfoData},
    FetchError, StageSource,
};
use crate::{
    error::{OctaviaError, OctaviaResult},
    metrics,
    stage::{CanonicalStage, Region, RegionGroup},
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::{Duration, Instant};

const FULL_INFO_PATH: &str = "/community/ugc_community/web/api/level/full/info";

/// Sub-queries bundled into every full-info request
const AGGREGATED_APIS: [&str; 3] = ["level_detail", "developer_info", "config"];

/// Upstream client configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Base URL for mainland regions
    pub cn_base_url: String,
    /// Base URL for overseas regions
    pub os_base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "Octavia/0.0.1 (kj415j45/octavia)".to_string(),
            timeout: Duration::from_secs(3),
            cn_base_url: "https://bbs-api.miyoushe.com".to_string(),
            os_base_url: "https://bbs-api-os.hoyolab.com".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AggRequest {
    api_name: &'static str,
}

#[derive(Debug, Serialize)]
struct FullInfoRequest<'a> {
    region: Region,
    level_id: &'a str,
    agg_req_list: Vec<AggRequest>,
}

/// Real upstream client
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a new upstream client
    pub fn new(config: UpstreamConfig) -> OctaviaResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| OctaviaError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Full-info endpoint for a region's host group
    fn endpoint(&self, region: Region) -> String {
        let base = match region.group() {
            RegionGroup::Mainland => &self.config.cn_base_url,
            RegionGroup::Overseas => &self.config.os_base_url,
        };
        format!("{}{}", base.trim_end_matches('/'), FULL_INFO_PATH)
    }

    async fn request_full_info(&self, region: Region, stage_id: &str) -> Result<CanonicalStage, FetchError> {
        let payload = FullInfoRequest {
            region,
            level_id: stage_id,
            agg_req_list: AGGREGATED_APIS
                .iter()
                .map(|&api_name| AggRequest { api_name })
                .collect(),
        };

        let response = self
            .http_client
            .post(self.endpoint(region))
            .json(&payload)
            .send()
            .await
            .map_err(|e| FetchError::Upstream(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Upstream(format!(
                "upstream returned status {}",
                response.status()
            )));
        }

        let envelope: Envelope<FullInfoData> = response
            .json()
            .await
            .map_err(|e| FetchError::Upstream(format!("invalid response body: {}", e)))?;

        normalize_full_info(region, stage_id, envelope)
    }
}

#[async_trait]
impl StageSource for UpstreamClient {
    async fn fetch_stage(&self, region: Region, stage_id: &str) -> Result<CanonicalStage, FetchError> {
        let started = Instant::now();
        let result = self.request_full_info(region, stage_id).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(FetchError::NotFound(_)) => "not_found",
            Err(FetchError::Upstream(_)) => "error",
        };
        metrics::record_upstream_request(region.as_str(), outcome, started.elapsed().as_secs_f64());

        match &result {
            Ok(_) => tracing::debug!(%region, stage_id, "Fetched stage from upstream"),
            Err(e) => tracing::debug!(%region, stage_id, error = %e, "Upstream fetch failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::normalize::tests::sample_body;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> UpstreamClient {
        UpstreamClient::new(UpstreamConfig {
            user_agent: "octavia-test".to_string(),
            timeout,
            cn_base_url: server.uri(),
            os_base_url: format!("{}/os", server.uri()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_stage_sends_aggregated_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FULL_INFO_PATH))
            .and(header("user-agent", "octavia-test"))
            .and(body_partial_json(serde_json::json!({
                "region": "cn_gf01",
                "level_id": "1234567890",
                "agg_req_list": [
                    { "api_name": "level_detail" },
                    { "api_name": "developer_info" },
                    { "api_name": "config" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(3));
        let stage = client.fetch_stage(Region::CnGf01, "1234567890").await.unwrap();

        assert_eq!(stage.level.meta.name, "Sky Garden");
        assert_eq!(stage.author.uid().as_deref(), Some("m777"));
    }

    #[tokio::test]
    async fn test_overseas_region_uses_overseas_host() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/os{}", FULL_INFO_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(3));
        let stage = client.fetch_stage(Region::OsEuro, "1234567890").await.unwrap();
        assert_eq!(stage.level.region, Region::OsEuro);
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(3));
        let err = client.fetch_stage(Region::CnGf01, "1").await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_body())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(200));
        let err = client.fetch_stage(Region::CnGf01, "1").await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(3));
        let err = client.fetch_stage(Region::CnGf01, "1").await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)));
    }
}

use latmon_common::{
    ErrorResponse, LatmonError, MetricsReport, MetricsRequest, Result, MAX_REGIONS_PER_REQUEST,
};

/// Latmon client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Latmon Client
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a new client with default configuration
    pub fn with_default_config() -> Self {
        Self::new(ClientConfig::default())
    }

    /// Build the URL of the metrics endpoint
    pub fn build_metrics_url(&self) -> String {
        format!("{}/api/metrics", self.config.base_url)
    }

    /// Fetch aggregate statistics for the given regions against the given
    /// latency threshold. The report carries one entry per requested region,
    /// `None` for regions the server has no telemetry for.
    pub async fn metrics(&self, regions: &[&str], threshold_ms: i64) -> Result<MetricsReport> {
        if regions.len() > MAX_REGIONS_PER_REQUEST {
            return Err(LatmonError::TooManyRegions(MAX_REGIONS_PER_REQUEST));
        }

        let request = MetricsRequest {
            regions: regions.iter().map(|s| s.to_string()).collect(),
            threshold_ms,
        };

        let response = self
            .http_client
            .post(self.build_metrics_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| LatmonError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        response
            .json::<MetricsReport>()
            .await
            .map_err(|e| LatmonError::NetworkError(e.to_string()))
    }
}

async fn parse_error_response(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> LatmonError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    LatmonError::HttpError(status.as_u16(), error_msg)
}

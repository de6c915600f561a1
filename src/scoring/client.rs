use crate::error::{CopilotError, Result};
use crate::scoring::types::{ScoreRequest, ScoreResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Default scoring endpoint: the analysis backend running locally
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/analyze";

/// Turns extracted listing data into a risk assessment
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse>;
}

/// Where and how to reach the scoring service
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ScoringConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Builder method: set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Scoring service reached over HTTP with a JSON POST
pub struct HttpScoringClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScoringClient {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim().to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(CopilotError::Config(format!(
                "scoring endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse> {
        log::info!("Submitting listing to {}", self.endpoint);
        log::debug!(
            "Request: {} description chars, stats spent={} rate={}",
            request.job_description.chars().count(),
            request.client_stats.spent,
            request.client_stats.rate
        );

        let resp = self.client.post(&self.endpoint).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CopilotError::ServerStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let response = ScoreResponse::from_json(&body)?;
        log::info!(
            "Received risk score {} with {} reason(s)",
            response.risk_score,
            response.risk_reasons.len()
        );
        Ok(response)
    }
}

//! # Prediction Client
//!
//! Wrapper around the remote prediction service.

use crate::config::PredictionConfig;
use diores_core::{PredictionRequest, PredictionResponse};
use std::time::Duration;
use thiserror::Error;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be built.
    #[error("Cannot build HTTP client: {0}")]
    Build(String),
    /// Cannot reach the prediction service.
    #[error("Cannot connect to the prediction service at {0}")]
    ConnectionFailed(String),
    /// The service did not answer in time.
    #[error("Prediction service timed out after {0}s")]
    Timeout(u64),
    /// 401 Unauthorized - invalid or missing API key.
    #[error("Unauthorized: invalid or missing API key")]
    Unauthorized,
    /// Any other non-success status.
    #[error("Prediction service error ({0}): {1}")]
    UpstreamStatus(u16, String),
    /// Failed to parse response body.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// HTTP client for the prediction service.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl PredictionClient {
    /// Create a client from the `[prediction]` configuration.
    pub fn new(config: &PredictionConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.endpoint
            ),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the finalized record and parse the probabilities.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, ClientError> {
        let mut builder = self.http.post(&self.url).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(url = %self.url, track = %request.track, "Sending prediction request");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else {
                ClientError::ConnectionFailed(format!("{}: {e}", self.url))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Prediction service rejected the request");
            return Err(ClientError::UpstreamStatus(status.as_u16(), body));
        }

        response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

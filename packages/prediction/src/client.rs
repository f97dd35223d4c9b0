//! HTTP client for the forecasting service.

use std::time::Duration;

use async_trait::async_trait;
use emigrant_stats_transform_models::PredictionPoint;

use crate::models::{PredictRequest, parse_all_response, parse_category_response};
use crate::retry::{RetryPolicy, send_json};
use crate::{PredictionBatch, PredictionError, PredictionService, YearsAhead};

/// Environment variable holding the service's base URL.
pub const BASE_URL_ENV: &str = "ML_API_URL";

/// Environment variable overriding the retry count.
pub const MAX_RETRIES_ENV: &str = "ML_API_MAX_RETRIES";

/// Base URL used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5432";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Forecasting service client.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl PredictionClient {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Creates a client from `ML_API_URL` and `ML_API_MAX_RETRIES`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut client = Self::new(base_url);
        if let Some(max_retries) = std::env::var(MAX_RETRIES_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            client.retry.max_retries = max_retries;
        }
        log::debug!(
            "Forecasting service at {} ({} retries)",
            client.base_url,
            client.retry.max_retries
        );
        client
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches model metadata for every category as the service reports it.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError`] if the request fails.
    pub async fn model_info_all(&self) -> Result<serde_json::Value, PredictionError> {
        let url = self.url("/api/model-info-all");
        send_json(self.retry, "Failed to fetch model information", || {
            self.client.get(&url)
        })
        .await
    }
}

#[async_trait]
impl PredictionService for PredictionClient {
    async fn predict_category(
        &self,
        category_key: &str,
        years_ahead: YearsAhead,
    ) -> Result<Vec<PredictionPoint>, PredictionError> {
        let url = self.url(&format!("/api/predict/{category_key}"));
        let body = PredictRequest { years_ahead };
        log::info!("Forecasting {category_key} {years_ahead} year(s) ahead");

        let value = send_json(
            self.retry,
            &format!("Failed to predict {category_key}"),
            || self.client.post(&url).json(&body),
        )
        .await?;
        parse_category_response(value)
    }

    async fn predict_all(
        &self,
        years_ahead: YearsAhead,
    ) -> Result<PredictionBatch, PredictionError> {
        let url = self.url("/api/predict-all");
        let body = PredictRequest { years_ahead };
        log::info!("Forecasting all categories {years_ahead} year(s) ahead");

        let value = send_json(self.retry, "Failed to predict all categories", || {
            self.client.post(&url).json(&body)
        })
        .await?;
        let batch = parse_all_response(value)?;
        for warning in &batch.warnings {
            log::warn!("Forecast failed for {warning}");
        }
        Ok(batch)
    }

    async fn health(&self) -> bool {
        let url = self.url("/api/health");
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    log::warn!("Forecasting service health check: HTTP {}", response.status());
                }
                ok
            }
            Err(e) => {
                log::error!("Forecasting service health check failed: {e}");
                false
            }
        }
    }
}

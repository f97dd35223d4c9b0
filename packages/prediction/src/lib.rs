#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the forecasting service.
//!
//! The service trains one model per category and returns yearly forecasts
//! for a number of years past the last observed year. A batch request
//! covers every category and may succeed for some categories and fail for
//! others; those failures come back as warnings rather than errors.

pub mod client;
pub mod models;
pub mod retry;

use async_trait::async_trait;
use emigrant_stats_transform_models::PredictionPoint;

pub use client::PredictionClient;
pub use models::{CategoryWarning, PredictionBatch, YearsAhead};

/// Errors that can occur when calling the forecasting service.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// The request could not be sent or its body not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with an error status. `message` is the
    /// service's own `error` text when it sent one.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The requested horizon is outside the supported range.
    #[error("Years ahead must be between {} and {}, got {value}", YearsAhead::MIN, YearsAhead::MAX)]
    InvalidYearsAhead {
        /// Rejected value.
        value: u32,
    },
}

impl PredictionError {
    /// Returns `true` if the failure is transient and the caller may retry
    /// later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => retry::is_transient(e),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) | Self::InvalidYearsAhead { .. } => false,
        }
    }
}

/// The forecasting operations the dashboard needs.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Forecasts one category, identified by its service key.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError`] if the service call fails.
    async fn predict_category(
        &self,
        category_key: &str,
        years_ahead: YearsAhead,
    ) -> Result<Vec<PredictionPoint>, PredictionError>;

    /// Forecasts every category the service knows.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError`] if the request as a whole fails.
    /// Per-category failures are reported in [`PredictionBatch::warnings`].
    async fn predict_all(&self, years_ahead: YearsAhead)
    -> Result<PredictionBatch, PredictionError>;

    /// Returns `true` if the service is reachable and healthy.
    async fn health(&self) -> bool;
}

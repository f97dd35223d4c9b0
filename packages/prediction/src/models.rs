//! Wire types of the forecasting service and their parsed forms.

use std::collections::BTreeMap;

use emigrant_stats_transform_models::PredictionPoint;
use serde::{Deserialize, Serialize};

use crate::PredictionError;

/// Number of years to forecast, between [`YearsAhead::MIN`] and
/// [`YearsAhead::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct YearsAhead(u32);

impl YearsAhead {
    /// Shortest supported horizon.
    pub const MIN: u32 = 1;
    /// Longest supported horizon.
    pub const MAX: u32 = 10;

    /// Validates a horizon.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidYearsAhead`] outside `1..=10`.
    pub fn new(value: u32) -> Result<Self, PredictionError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PredictionError::InvalidYearsAhead { value })
        }
    }

    /// The horizon in years.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for YearsAhead {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for YearsAhead {
    type Error = PredictionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for YearsAhead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of both predict requests.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PredictRequest {
    /// Forecast horizon.
    pub years_ahead: YearsAhead,
}

/// One forecast year as the service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePrediction {
    /// Forecast year.
    pub year: i32,
    /// Field name to forecast value.
    pub predictions: BTreeMap<String, f64>,
}

impl From<WirePrediction> for PredictionPoint {
    fn from(w: WirePrediction) -> Self {
        Self {
            year: w.year,
            values: w.predictions,
        }
    }
}

/// Response of the single-category endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPredictionsResponse {
    /// Echoed category key.
    #[serde(default)]
    pub category: Option<String>,
    /// Forecast years.
    pub predictions: Vec<WirePrediction>,
}

/// Response of the batch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AllPredictionsResponse {
    /// Category key to forecast years.
    #[serde(default)]
    pub predictions: BTreeMap<String, Vec<WirePrediction>>,
    /// Category key to error message for categories that failed.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

/// Error body the service sends with a failing status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// A category the batch could not forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWarning {
    /// Category key.
    pub category: String,
    /// Error message from the service.
    pub message: String,
}

impl std::fmt::Display for CategoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Forecasts for every category that succeeded, plus warnings for the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionBatch {
    /// Category key to forecast points in year order.
    pub predictions: BTreeMap<String, Vec<PredictionPoint>>,
    /// Categories that failed.
    pub warnings: Vec<CategoryWarning>,
}

impl From<AllPredictionsResponse> for PredictionBatch {
    fn from(response: AllPredictionsResponse) -> Self {
        let predictions = response
            .predictions
            .into_iter()
            .map(|(category, points)| {
                let mut points: Vec<PredictionPoint> =
                    points.into_iter().map(PredictionPoint::from).collect();
                points.sort_by_key(|p| p.year);
                (category, points)
            })
            .collect();
        let warnings = response
            .errors
            .into_iter()
            .map(|(category, message)| CategoryWarning { category, message })
            .collect();
        Self {
            predictions,
            warnings,
        }
    }
}

/// Parses a single-category response body.
///
/// # Errors
///
/// Returns [`PredictionError::Json`] if the body does not match.
pub fn parse_category_response(
    value: serde_json::Value,
) -> Result<Vec<PredictionPoint>, PredictionError> {
    let response: CategoryPredictionsResponse = serde_json::from_value(value)?;
    let mut points: Vec<PredictionPoint> = response
        .predictions
        .into_iter()
        .map(PredictionPoint::from)
        .collect();
    points.sort_by_key(|p| p.year);
    Ok(points)
}

/// Parses a batch response body.
///
/// # Errors
///
/// Returns [`PredictionError::Json`] if the body does not match.
pub fn parse_all_response(value: serde_json::Value) -> Result<PredictionBatch, PredictionError> {
    let response: AllPredictionsResponse = serde_json::from_value(value)?;
    Ok(response.into())
}

/// Builds the message for a failing response: the service's `error` text
/// when the body carries one, otherwise `fallback` with the status.
#[must_use]
pub fn error_message(status: u16, body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .ok()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("{fallback} (HTTP {status})"))
}

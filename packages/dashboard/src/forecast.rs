//! Historical series joined with their forecasts.

use emigrant_stats_category::forecast_categories;
use emigrant_stats_category_models::{Category, CategoryDefinition};
use emigrant_stats_prediction::{PredictionService, YearsAhead};
use emigrant_stats_store::RecordStore;
use emigrant_stats_transform::merge::merge_predictions;
use emigrant_stats_transform_models::{ChartRow, TimeSeries, Vocabulary};
use futures::future::{join, join_all};
use serde::Serialize;

use crate::{DashboardError, load_series};

/// Forecast chart of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastView {
    /// Category identifier.
    pub category: Category,
    /// Display name.
    pub label: String,
    /// Key the forecasting service knows the category by.
    pub prediction_key: String,
    /// Field order of the historical series.
    pub vocabulary: Vocabulary,
    /// Historical rows followed by forecast rows.
    pub rows: Vec<ChartRow>,
    /// Whether the service returned a forecast for this category.
    pub has_forecast: bool,
}

/// Forecast charts for every forecast category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDashboard {
    /// Forecast horizon.
    pub years_ahead: YearsAhead,
    /// One chart per category whose history loaded.
    pub categories: Vec<ForecastView>,
    /// Categories that failed to load or forecast, as messages.
    pub warnings: Vec<String>,
}

/// Loads every forecast category and merges it with the service's batch
/// forecast.
///
/// History loads run concurrently with each other and with the forecast
/// request. A category whose history fails to load, or whose forecast is
/// missing or inconsistent with its history, is reported in
/// [`ForecastDashboard::warnings`] and does not affect the others.
///
/// # Errors
///
/// Returns [`DashboardError::Prediction`] if the batch forecast request
/// fails as a whole.
pub async fn prediction_dashboard(
    store: &dyn RecordStore,
    service: &dyn PredictionService,
    years_ahead: YearsAhead,
) -> Result<ForecastDashboard, DashboardError> {
    let defs: Vec<(CategoryDefinition, String)> = forecast_categories()
        .into_iter()
        .filter_map(|def| {
            let key = def.prediction_key.clone()?;
            Some((def, key))
        })
        .collect();

    log::info!(
        "Building forecasts for {} categories, {years_ahead} year(s) ahead",
        defs.len()
    );

    let histories = join_all(defs.iter().map(|(def, _)| load_series(store, def)));
    let (histories, batch) = join(histories, service.predict_all(years_ahead)).await;
    let batch = batch?;

    let mut warnings: Vec<String> = batch.warnings.iter().map(ToString::to_string).collect();
    let mut categories = Vec::with_capacity(defs.len());

    for ((def, key), history) in defs.into_iter().zip(histories) {
        let series = match history {
            Ok(series) => series,
            Err(e) => {
                log::error!("{}: failed to load history: {e}", def.id);
                warnings.push(format!("{}: {e}", def.label));
                continue;
            }
        };

        let points = batch.predictions.get(&key).map_or(&[][..], Vec::as_slice);
        if points.is_empty() && !batch.warnings.iter().any(|w| w.category == key) {
            warnings.push(format!("{key}: no forecast returned"));
        }

        let (rows, has_forecast) = match merge_predictions(&series, points) {
            Ok(rows) => (rows, !points.is_empty()),
            Err(e) => {
                log::warn!("{}: discarding forecast: {e}", def.id);
                warnings.push(format!("{key}: {e}"));
                (history_only(&series), false)
            }
        };

        categories.push(ForecastView {
            category: def.id,
            label: def.label,
            prediction_key: key,
            vocabulary: series.vocabulary().clone(),
            rows,
            has_forecast,
        });
    }

    Ok(ForecastDashboard {
        years_ahead,
        categories,
        warnings,
    })
}

fn history_only(series: &TimeSeries) -> Vec<ChartRow> {
    merge_predictions(series, &[]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use emigrant_stats_prediction::{CategoryWarning, PredictionBatch, PredictionError};
    use emigrant_stats_store::MemoryStore;
    use emigrant_stats_transform_models::{PredictionPoint, YearRecord};

    use super::*;

    struct FixedService {
        batch: Option<PredictionBatch>,
    }

    #[async_trait]
    impl PredictionService for FixedService {
        async fn predict_category(
            &self,
            category_key: &str,
            _years_ahead: YearsAhead,
        ) -> Result<Vec<PredictionPoint>, PredictionError> {
            Ok(self
                .batch
                .as_ref()
                .and_then(|b| b.predictions.get(category_key).cloned())
                .unwrap_or_default())
        }

        async fn predict_all(
            &self,
            _years_ahead: YearsAhead,
        ) -> Result<PredictionBatch, PredictionError> {
            self.batch.clone().ok_or_else(|| PredictionError::Api {
                status: 503,
                message: "Model server unavailable".to_string(),
            })
        }

        async fn health(&self) -> bool {
            self.batch.is_some()
        }
    }

    fn point(year: i32, field: &str, value: f64) -> PredictionPoint {
        PredictionPoint {
            year,
            values: BTreeMap::from([(field.to_string(), value)]),
        }
    }

    async fn sex_store() -> MemoryStore {
        let store = MemoryStore::new();
        for (year, male) in [(2019, 10), (2020, 12)] {
            store
                .upsert(
                    Category::Sex,
                    YearRecord::new(year)
                        .with_field("MALE", male)
                        .with_field("FEMALE", 20),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn merges_forecast_after_history() {
        let store = sex_store().await;
        let service = FixedService {
            batch: Some(PredictionBatch {
                predictions: BTreeMap::from([(
                    "sex".to_string(),
                    vec![point(2021, "MALE", 13.0), point(2022, "MALE", 14.0)],
                )]),
                warnings: vec![CategoryWarning {
                    category: "origin".to_string(),
                    message: "Model not trained".to_string(),
                }],
            }),
        };

        let dashboard = prediction_dashboard(&store, &service, YearsAhead::default())
            .await
            .unwrap();

        let sex = dashboard
            .categories
            .iter()
            .find(|c| c.category == Category::Sex)
            .unwrap();
        assert!(sex.has_forecast);
        assert_eq!(sex.rows.len(), 4);
        assert_eq!(sex.rows[1].values["MALE_pred"], Some(12.0));
        assert_eq!(sex.rows[2].values["MALE"], None);
        assert_eq!(sex.rows[3].values["MALE_pred"], Some(14.0));

        assert!(dashboard
            .warnings
            .contains(&"origin: Model not trained".to_string()));
        assert!(dashboard
            .warnings
            .contains(&"age: no forecast returned".to_string()));
        assert!(!dashboard.warnings.iter().any(|w| w.starts_with("origin: no")));
    }

    #[tokio::test]
    async fn overlapping_forecast_keeps_history() {
        let store = sex_store().await;
        let service = FixedService {
            batch: Some(PredictionBatch {
                predictions: BTreeMap::from([(
                    "sex".to_string(),
                    vec![point(2020, "MALE", 99.0)],
                )]),
                warnings: Vec::new(),
            }),
        };

        let dashboard = prediction_dashboard(&store, &service, YearsAhead::default())
            .await
            .unwrap();
        let sex = dashboard
            .categories
            .iter()
            .find(|c| c.category == Category::Sex)
            .unwrap();
        assert!(!sex.has_forecast);
        assert_eq!(sex.rows.len(), 2);
        assert!(dashboard.warnings.iter().any(|w| w.starts_with("sex: ")));
    }

    #[tokio::test]
    async fn failed_batch_is_an_error() {
        let store = sex_store().await;
        let service = FixedService { batch: None };
        let err = prediction_dashboard(&store, &service, YearsAhead::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Prediction(_)));
    }

    #[tokio::test]
    async fn every_forecast_category_gets_a_chart() {
        let store = MemoryStore::new();
        let service = FixedService {
            batch: Some(PredictionBatch::default()),
        };
        let dashboard = prediction_dashboard(&store, &service, YearsAhead::new(1).unwrap())
            .await
            .unwrap();
        assert_eq!(dashboard.categories.len(), 7);
        assert!(dashboard.categories.iter().all(|c| c.rows.is_empty()));
        assert_eq!(dashboard.warnings.len(), 7);
    }
}

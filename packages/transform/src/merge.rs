//! Joining a historical series with forecast values into one chart.

use std::collections::{BTreeMap, BTreeSet};

use emigrant_stats_transform_models::{ChartRow, PredictionPoint, TimeSeries, prediction_key};

use crate::TransformError;

/// Builds chart rows for a historical series followed by its forecast.
///
/// Historical rows carry `field: value, field_pred: null`, forecast rows
/// carry `field: null, field_pred: value`. When there is a forecast the last
/// historical row carries both, so the two lines meet without a gap.
/// Forecast fields outside the vocabulary are appended in name order.
///
/// # Errors
///
/// * [`TransformError::PredictionOverlap`] if a forecast year is not after
///   the last historical year
/// * [`TransformError::DuplicateYear`] if two forecast points share a year
pub fn merge_predictions(
    series: &TimeSeries,
    predictions: &[PredictionPoint],
) -> Result<Vec<ChartRow>, TransformError> {
    let mut forecast: Vec<&PredictionPoint> = predictions.iter().collect();
    forecast.sort_by_key(|p| p.year);

    if let Some(last_year) = series.last_year()
        && let Some(p) = forecast.iter().find(|p| p.year <= last_year)
    {
        return Err(TransformError::PredictionOverlap {
            year: p.year,
            last_year,
        });
    }
    if let Some(pair) = forecast.windows(2).find(|w| w[0].year == w[1].year) {
        return Err(TransformError::DuplicateYear { year: pair[0].year });
    }

    let mut fields: Vec<String> = series.vocabulary().fields().to_vec();
    let extra: BTreeSet<&String> = forecast
        .iter()
        .flat_map(|p| p.values.keys())
        .filter(|k| !series.vocabulary().contains(k))
        .collect();
    fields.extend(extra.into_iter().cloned());

    let records = series.records();
    let mut rows = Vec::with_capacity(records.len() + forecast.len());

    for (idx, record) in records.iter().enumerate() {
        let boundary = idx + 1 == records.len() && !forecast.is_empty();
        let mut values = BTreeMap::new();
        for field in &fields {
            #[allow(clippy::cast_precision_loss)]
            let observed = record.fields.get(field).map(|v| *v as f64);
            let observed = observed.or_else(|| series.vocabulary().contains(field).then_some(0.0));
            values.insert(field.clone(), observed);
            values.insert(prediction_key(field), if boundary { observed } else { None });
        }
        rows.push(ChartRow {
            year: record.year,
            is_prediction: false,
            values,
        });
    }

    for point in forecast {
        let mut values = BTreeMap::new();
        for field in &fields {
            values.insert(field.clone(), None);
            values.insert(prediction_key(field), point.values.get(field).copied());
        }
        rows.push(ChartRow {
            year: point.year,
            is_prediction: true,
            values,
        });
    }

    Ok(rows)
}

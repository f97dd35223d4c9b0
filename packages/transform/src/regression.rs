//! Least-squares trendlines over yearly values.

use emigrant_stats_transform_models::{FieldTrend, ScatterPoint, TimeSeries, TrendLine};

use crate::TransformError;

/// Fits `y = slope * x + intercept` by ordinary least squares.
///
/// # Errors
///
/// Returns [`TransformError::DegenerateRegression`] when the x values have
/// no variance, which includes fewer than two points.
pub fn fit_trend(points: &[(f64, f64)]) -> Result<TrendLine, TransformError> {
    let degenerate = || TransformError::DegenerateRegression {
        points: points.len(),
    };

    if points.len() < 2 {
        return Err(degenerate());
    }

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), &(x, y)| (sx + x, sy + y, x.mul_add(y, sxy), x.mul_add(x, sxx)),
    );

    let denominator = n.mul_add(sum_xx, -(sum_x * sum_x));
    if denominator.abs() < f64::EPSILON || !denominator.is_finite() {
        return Err(degenerate());
    }

    let slope = n.mul_add(sum_xy, -(sum_x * sum_y)) / denominator;
    let intercept = slope.mul_add(-sum_x, sum_y) / n;

    Ok(TrendLine { slope, intercept })
}

/// Observed `(year, value)` points of one field, in year order.
#[must_use]
pub fn scatter_points(series: &TimeSeries, field: &str) -> Vec<ScatterPoint> {
    series
        .records()
        .iter()
        .map(|r| ScatterPoint {
            x: r.year,
            y: r.get(field),
        })
        .collect()
}

/// Scatter points and fitted trendline of one field.
///
/// # Errors
///
/// Returns [`TransformError::DegenerateRegression`] if the series spans
/// fewer than two years.
pub fn field_trend(series: &TimeSeries, field: &str) -> Result<FieldTrend, TransformError> {
    let points = scatter_points(series, field);
    #[allow(clippy::cast_precision_loss)]
    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (f64::from(p.x), p.y as f64))
        .collect();
    let line = fit_trend(&xy)?;

    let (min_year, max_year) = match (series.first_year(), series.last_year()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(TransformError::DegenerateRegression { points: 0 }),
    };

    Ok(FieldTrend {
        field: field.to_string(),
        endpoints: line.endpoints(min_year, max_year),
        points,
        line,
    })
}

/// [`field_trend`] for every vocabulary field, paired with the field name.
#[must_use]
pub fn field_trends(series: &TimeSeries) -> Vec<(String, Result<FieldTrend, TransformError>)> {
    series
        .vocabulary()
        .iter()
        .map(|field| (field.clone(), field_trend(series, field)))
        .collect()
}

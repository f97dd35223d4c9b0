//! Everything one category page renders.

use emigrant_stats_category_models::{Category, CategoryDefinition};
use emigrant_stats_geography::countries::country_buckets;
use emigrant_stats_geography::provinces::{ProvinceTotals, province_totals};
use emigrant_stats_store::RecordStore;
use emigrant_stats_transform::YearFilter;
use emigrant_stats_transform::mapping::apply_merge;
use emigrant_stats_transform::periods::build_periods;
use emigrant_stats_transform::pyramid::population_pyramid;
use emigrant_stats_transform::ranking::{field_totals, rank_totals};
use emigrant_stats_transform::regression::field_trends;
use emigrant_stats_transform_models::{
    FieldTrend, GeoBucket, PeriodAggregate, PyramidRecord, RankedTotal, TimeSeries, Vocabulary,
    YearRecord,
};
use serde::Serialize;

use crate::{DashboardError, load_series};

/// Derived series of one category, ready for charting.
///
/// Views the category does not enable are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    /// Category identifier.
    pub category: Category,
    /// Display name.
    pub label: String,
    /// Year selection applied to the single-year views.
    pub year_filter: YearFilter,
    /// Every year with data, for the year selector.
    pub years: Vec<i32>,
    /// Field order after composite labels are applied.
    pub vocabulary: Vocabulary,
    /// Yearly records after composite labels are applied.
    pub records: Vec<YearRecord>,
    /// Fixed-length period sums.
    pub periods: Vec<PeriodAggregate>,
    /// Population pyramid per period.
    pub pyramid: Vec<PyramidRecord>,
    /// Scatter points and trendline per field.
    pub trends: Vec<FieldTrend>,
    /// Totals sorted descending.
    pub ranking: Vec<RankedTotal>,
    /// Totals in field order.
    pub treemap: Vec<RankedTotal>,
    /// Country totals classified into tiers.
    pub choropleth: Vec<GeoBucket>,
    /// Normalized province totals.
    pub provinces: ProvinceTotals,
    /// Problems that left part of the view out.
    pub warnings: Vec<String>,
}

impl CategoryView {
    /// Returns `true` if the category has no data for the page to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads a category and builds its view.
///
/// Composite labels are applied before any aggregation, so the yearly
/// records and the periods agree. `year_filter` narrows the ranking,
/// treemap, choropleth and province totals; the other views always span
/// every year.
///
/// # Errors
///
/// Returns [`DashboardError`] if loading fails or the definition's period
/// length is zero.
pub async fn load_category(
    store: &dyn RecordStore,
    def: &CategoryDefinition,
    year_filter: YearFilter,
) -> Result<CategoryView, DashboardError> {
    let series = load_series(store, def).await?;
    build_view(def, &series, year_filter)
}

/// Builds the view of an already-loaded series.
///
/// # Errors
///
/// Returns [`DashboardError::Transform`] if the definition's period length
/// is zero.
pub fn build_view(
    def: &CategoryDefinition,
    series: &TimeSeries,
    year_filter: YearFilter,
) -> Result<CategoryView, DashboardError> {
    let merged = apply_merge(series, &def.merge);
    let mut view = CategoryView {
        category: def.id,
        label: def.label.clone(),
        year_filter,
        years: merged.records().iter().map(|r| r.year).collect(),
        vocabulary: merged.vocabulary().clone(),
        records: merged.records().to_vec(),
        periods: Vec::new(),
        pyramid: Vec::new(),
        trends: Vec::new(),
        ranking: Vec::new(),
        treemap: Vec::new(),
        choropleth: Vec::new(),
        provinces: ProvinceTotals::default(),
        warnings: Vec::new(),
    };

    if merged.is_empty() {
        log::debug!("{}: no data", def.id);
        return Ok(view);
    }

    if let Some(length) = def.period_length
        && let (Some(first), Some(last)) = (merged.first_year(), merged.last_year())
    {
        view.periods = build_periods(&merged, def.start_year.min(first), last, length)?;
        if let Some(pyramid) = &def.pyramid {
            view.pyramid = population_pyramid(&view.periods, pyramid);
        }
    }

    if def.views.trends {
        for (field, trend) in field_trends(&merged) {
            match trend {
                Ok(trend) => view.trends.push(trend),
                Err(e) => {
                    log::warn!("{}: no trendline for {field}: {e}", def.id);
                    view.warnings.push(format!("No trendline for {field}: {e}"));
                }
            }
        }
    }

    let selected = year_filter.apply(&merged);
    if let YearFilter::Year(year) = year_filter
        && selected.is_empty()
    {
        view.warnings.push(format!("No data for {year}"));
    }

    if def.views.ranking || def.views.choropleth {
        view.ranking = rank_totals(&selected);
    }
    if def.views.treemap {
        view.treemap = field_totals(&selected);
    }
    if def.views.choropleth {
        view.choropleth = country_buckets(&view.ranking);
    }
    if def.views.province_map {
        view.provinces = province_totals(&selected);
    }

    log::info!(
        "{}: {} year(s), {} period(s), filter {year_filter}",
        def.id,
        view.years.len(),
        view.periods.len()
    );

    Ok(view)
}

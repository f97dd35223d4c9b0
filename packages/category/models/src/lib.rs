#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Category identifiers and definition types for the emigrant statistics
//! dataset.
//!
//! A category is one statistical dimension (age, sex, civil status, ...).
//! Each category is described by a [`CategoryDefinition`] that tells the
//! generic transform pipeline how the source CSV is laid out, which
//! sub-categories exist and in what order, how years are grouped into
//! periods, and which derived views the dashboard renders.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One statistical dimension of the emigrant dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Emigrants by age group.
    Age,
    /// Emigrants by sex.
    Sex,
    /// Emigrants by civil status.
    CivilStatus,
    /// Emigrants by educational attainment.
    Education,
    /// Emigrants by occupation prior to migration.
    Occupation,
    /// Emigrants to the eleven major destination countries.
    MajorDestination,
    /// Emigrants to every destination country.
    AllDestination,
    /// Emigrants by region of origin.
    Region,
    /// Emigrants by province of origin.
    Province,
}

impl Category {
    /// Returns all variants of this enum in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Age,
            Self::Sex,
            Self::CivilStatus,
            Self::Education,
            Self::Occupation,
            Self::MajorDestination,
            Self::AllDestination,
            Self::Region,
            Self::Province,
        ]
    }
}

/// How the rows and columns of a category's source CSV are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One row per sub-category, one column per year
    /// (e.g. `AGE_GROUP,1981,1982,...`).
    CategoryMajor,
    /// One row per year, one column per sub-category
    /// (e.g. `YEAR,MALE,FEMALE`).
    YearMajor,
}

/// Collapses several raw sub-category labels into one aggregate label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRule {
    /// Aggregate label shown on charts (e.g. `"Elementary"`).
    pub label: String,
    /// Raw labels summed into the aggregate.
    pub sources: Vec<String>,
}

/// Which two fields form a population pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidConfig {
    /// Field drawn to the left of zero (negated for display).
    pub mirrored: String,
    /// Field drawn to the right of zero.
    pub other: String,
}

/// Derived views a category supports beyond the plain yearly series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Views {
    /// Per-field scatter points with a least-squares trendline.
    pub trends: bool,
    /// Totals over all years sorted descending (bar chart).
    pub ranking: bool,
    /// Totals over all years in vocabulary order (treemap).
    pub treemap: bool,
    /// Country totals classified into concentration tiers.
    pub choropleth: bool,
    /// Normalized province totals for the province map.
    pub province_map: bool,
}

/// Everything the pipeline needs to know about one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Category identifier.
    pub id: Category,
    /// Human-readable name (e.g. `"Age Groups"`).
    pub label: String,
    /// Short description shown on the upload card.
    pub description: String,
    /// Name of the identifying CSV column (`AGE_GROUP`, `YEAR`, ...).
    pub identifier_column: String,
    /// Arrangement of the source CSV.
    pub layout: Layout,
    /// First year covered by the published dataset.
    pub start_year: i32,
    /// Last year covered by the published dataset.
    pub end_year: i32,
    /// Number of years per period for stacked views, if any.
    #[serde(default)]
    pub period_length: Option<u32>,
    /// Canonical sub-category order. Empty when the vocabulary is
    /// discovered from the uploaded file.
    #[serde(default)]
    pub vocabulary: Vec<String>,
    /// Number of sub-categories an upload must contain, if fixed.
    #[serde(default)]
    pub expected_fields: Option<usize>,
    /// Composite labels applied before any aggregation.
    #[serde(default)]
    pub merge: Vec<MergeRule>,
    /// Population pyramid fields, if the category has one.
    #[serde(default)]
    pub pyramid: Option<PyramidConfig>,
    /// Enabled derived views.
    #[serde(default)]
    pub views: Views,
    /// Human-readable upload requirements.
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Key used by the forecasting service, if the category is forecast.
    #[serde(default)]
    pub prediction_key: Option<String>,
}

impl CategoryDefinition {
    /// Returns `true` if the definition pins the sub-category order.
    #[must_use]
    pub fn has_canonical_vocabulary(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Returns `true` if the forecasting service covers this category.
    #[must_use]
    pub const fn is_forecast(&self) -> bool {
        self.prediction_key.is_some()
    }
}

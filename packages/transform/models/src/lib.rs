#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types produced by the category transform pipeline.
//!
//! Everything here is an immutable projection of a record store snapshot.
//! Values are recomputed from scratch whenever the snapshot or a view
//! parameter changes; nothing carries identity of its own.

use std::collections::BTreeMap;

use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display};

/// Suffix appended to a field name for its forecast series in a
/// [`ChartRow`].
pub const PREDICTION_SUFFIX: &str = "_pred";

/// The values of one category for a single year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    /// Calendar year.
    pub year: i32,
    /// Sub-category name to emigrant count.
    pub fields: BTreeMap<String, i64>,
}

impl YearRecord {
    /// Creates an empty record for `year`.
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self {
            year,
            fields: BTreeMap::new(),
        }
    }

    /// Adds or replaces a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: i64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns the value of `field`, or `0` if the record lacks it.
    #[must_use]
    pub fn get(&self, field: &str) -> i64 {
        self.fields.get(field).copied().unwrap_or(0)
    }
}

/// Ordered list of the sub-category names of one category.
///
/// The order drives iteration, legends, and tie-breaking, so it always
/// comes from the source file or a canonical list and never from map key
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    /// Creates a vocabulary, dropping blank and repeated names while
    /// keeping first-seen order.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !name.trim().is_empty() && !fields.contains(&name) {
                fields.push(name);
            }
        }
        Self(fields)
    }

    /// Discovers a vocabulary from the keys of `records`, sorted by name.
    ///
    /// Only used when neither the source file nor the category definition
    /// provides an order.
    #[must_use]
    pub fn discover(records: &[YearRecord]) -> Self {
        let mut names: Vec<&String> = records.iter().flat_map(|r| r.fields.keys()).collect();
        names.sort_unstable();
        names.dedup();
        Self::new(names.into_iter().cloned())
    }

    /// Field names in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Iterates over the field names in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the vocabulary has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `field` is part of the vocabulary.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Error returned when a series would contain the same year twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateYearError {
    /// The repeated year.
    pub year: i32,
}

impl std::fmt::Display for DuplicateYearError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "year {} appears more than once in the series", self.year)
    }
}

impl std::error::Error for DuplicateYearError {}

/// Year-ordered records of one category with its vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    vocabulary: Vocabulary,
    records: Vec<YearRecord>,
}

impl TimeSeries {
    /// Builds a series sorted ascending by year.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateYearError`] if two records share a year.
    pub fn new(
        vocabulary: Vocabulary,
        mut records: Vec<YearRecord>,
    ) -> Result<Self, DuplicateYearError> {
        records.sort_by_key(|r| r.year);
        if let Some(pair) = records.windows(2).find(|w| w[0].year == w[1].year) {
            return Err(DuplicateYearError { year: pair[0].year });
        }
        Ok(Self {
            vocabulary,
            records,
        })
    }

    /// The sub-category order of this series.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Records in ascending year order.
    #[must_use]
    pub fn records(&self) -> &[YearRecord] {
        &self.records
    }

    /// Returns `true` if the series has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest year in the series.
    #[must_use]
    pub fn first_year(&self) -> Option<i32> {
        self.records.first().map(|r| r.year)
    }

    /// Latest year in the series.
    #[must_use]
    pub fn last_year(&self) -> Option<i32> {
        self.records.last().map(|r| r.year)
    }

    /// Looks up the record for `year`.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<&YearRecord> {
        self.records
            .binary_search_by_key(&year, |r| r.year)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Returns a copy holding only the records `keep` accepts.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&YearRecord) -> bool) -> Self {
        Self {
            vocabulary: self.vocabulary.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rebuilds every record's fields with `remap`, keeping the years, and
    /// replaces the vocabulary.
    #[must_use]
    pub fn remap_fields(
        &self,
        vocabulary: Vocabulary,
        remap: impl Fn(&YearRecord) -> BTreeMap<String, i64>,
    ) -> Self {
        Self {
            vocabulary,
            records: self
                .records
                .iter()
                .map(|r| YearRecord {
                    year: r.year,
                    fields: remap(r),
                })
                .collect(),
        }
    }

    /// Consumes the series, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vocabulary, Vec<YearRecord>) {
        (self.vocabulary, self.records)
    }
}

/// Sum of each field over a span of consecutive years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAggregate {
    /// Display label, `"{start} - {end}"`.
    pub label: String,
    /// First year of the period.
    pub start_year: i32,
    /// Last year of the period (clipped to the end of the data).
    pub end_year: i32,
    /// Field name to summed count.
    pub fields: BTreeMap<String, i64>,
}

impl PeriodAggregate {
    /// Returns the sum for `field`, or `0` if absent.
    #[must_use]
    pub fn get(&self, field: &str) -> i64 {
        self.fields.get(field).copied().unwrap_or(0)
    }
}

/// Total of one field across a whole series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTotal {
    /// Field name.
    pub label: String,
    /// Sum over every year.
    pub total: i64,
}

/// Concentration tier used to colour the choropleth map.
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
    AsRefStr,
)]
pub enum GeoTier {
    /// Below 10,000.
    Nil,
    /// 10,000 and above.
    Slight,
    /// 100,000 and above.
    Moderate,
    /// 500,000 and above.
    Significant,
    /// 1,000,000 and above.
    Extreme,
}

impl GeoTier {
    /// Tiers from the highest threshold down, the order they are tested in.
    pub const DESCENDING: [Self; 5] = [
        Self::Extreme,
        Self::Significant,
        Self::Moderate,
        Self::Slight,
        Self::Nil,
    ];

    /// Inclusive lower bound of the tier.
    #[must_use]
    pub const fn threshold(self) -> i64 {
        match self {
            Self::Extreme => 1_000_000,
            Self::Significant => 500_000,
            Self::Moderate => 100_000,
            Self::Slight => 10_000,
            Self::Nil => 0,
        }
    }

    /// Display colour as a hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Extreme => "#5EEAD4",
            Self::Significant => "#2DD4BF",
            Self::Moderate => "#0D9488",
            Self::Slight => "#155E75",
            Self::Nil => "#1E293B",
        }
    }

    /// Position on the choropleth colour scale, `0` (Nil) to `4` (Extreme).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Legend caption.
    #[must_use]
    pub const fn legend(self) -> &'static str {
        match self {
            Self::Extreme => "Extreme (≥1M)",
            Self::Significant => "Significant (≥500K)",
            Self::Moderate => "Moderate (≥100K)",
            Self::Slight => "Slight (≥10K)",
            Self::Nil => "Nil (<10K)",
        }
    }
}

/// A total classified into a concentration tier for one map feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBucket {
    /// Source label (e.g. the country name as written in the CSV).
    pub label: String,
    /// Map feature id (ISO3 code when known, otherwise the label).
    pub id: String,
    /// Total over the selected years.
    pub total: i64,
    /// Concentration tier.
    pub tier: GeoTier,
    /// Ordinal of the tier on the colour scale.
    pub value: u8,
    /// Tier colour.
    pub color: String,
}

/// A least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendLine {
    /// Change in value per year.
    pub slope: f64,
    /// Value at year zero.
    pub intercept: f64,
}

impl TrendLine {
    /// Evaluates the line at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }

    /// The two points used to draw the line between `min_year` and
    /// `max_year`.
    #[must_use]
    pub fn endpoints(&self, min_year: i32, max_year: i32) -> [TrendPoint; 2] {
        [
            TrendPoint {
                x: min_year,
                y: self.predict(f64::from(min_year)),
            },
            TrendPoint {
                x: max_year,
                y: self.predict(f64::from(max_year)),
            },
        ]
    }
}

/// One endpoint of a drawn trendline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Year.
    pub x: i32,
    /// Fitted value.
    pub y: f64,
}

/// One observed `(year, value)` pair of a scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Year.
    pub x: i32,
    /// Observed value.
    pub y: i64,
}

/// Scatter data and fitted trendline for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTrend {
    /// Field name.
    pub field: String,
    /// Observed points.
    pub points: Vec<ScatterPoint>,
    /// Fitted line.
    pub line: TrendLine,
    /// Line endpoints at the first and last observed year.
    pub endpoints: [TrendPoint; 2],
}

/// One bar pair of a population pyramid.
///
/// Serializes with the field names as keys, plus a `<Field>Negative` key
/// holding the mirrored value negated for display (e.g. `MaleNegative`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidRecord {
    /// Period label.
    pub period: String,
    /// Name of the field drawn to the left of zero.
    pub mirrored_field: String,
    /// Name of the field drawn to the right of zero.
    pub other_field: String,
    /// Raw value of the mirrored field.
    pub mirrored: i64,
    /// Raw value of the other field.
    pub other: i64,
    /// `-mirrored`, the value actually drawn.
    pub mirrored_negative: i64,
}

impl PyramidRecord {
    /// Key of the negated display series, e.g. `MALE` → `MaleNegative`.
    #[must_use]
    pub fn negative_key(&self) -> String {
        negative_key(&self.mirrored_field)
    }
}

/// Builds the display key for a negated pyramid series: the field name in
/// title case followed by `Negative`.
#[must_use]
pub fn negative_key(field: &str) -> String {
    let mut chars = field.chars();
    let mut key = String::with_capacity(field.len() + "Negative".len());
    if let Some(first) = chars.next() {
        key.extend(first.to_uppercase());
        key.push_str(&chars.as_str().to_lowercase());
    }
    key.push_str("Negative");
    key
}

impl Serialize for PyramidRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("period", &self.period)?;
        map.serialize_entry(&self.mirrored_field, &self.mirrored)?;
        map.serialize_entry(&self.other_field, &self.other)?;
        map.serialize_entry(&self.negative_key(), &self.mirrored_negative)?;
        map.end()
    }
}

/// Forecast values of one category for a future year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    /// Forecast year.
    pub year: i32,
    /// Field name to forecast value.
    pub values: BTreeMap<String, f64>,
}

/// One row of a historical-plus-forecast line chart.
///
/// `values` holds `field` keys for observed values and `field_pred` keys
/// for forecast values; an absent series is `None` (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    /// Year.
    pub year: i32,
    /// `true` for forecast years.
    pub is_prediction: bool,
    /// Series key to value.
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// Returns the forecast series key for `field`.
#[must_use]
pub fn prediction_key(field: &str) -> String {
    format!("{field}{PREDICTION_SUFFIX}")
}

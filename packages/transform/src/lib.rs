#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Category transform library.
//!
//! Turns raw per-category tabular records into chart-ready series. The
//! pipeline is generic: every step is parameterized by a category's
//! vocabulary, identifying column, and period length instead of being
//! written once per category.
//!
//! All functions here are pure and synchronous. Empty input yields empty
//! output, and unparseable cells read as zero (see [`parsing`]).

pub mod choropleth;
pub mod filter;
pub mod mapping;
pub mod merge;
pub mod parsing;
pub mod periods;
pub mod pivot;
pub mod pyramid;
pub mod ranking;
pub mod regression;

pub use emigrant_stats_transform_models as models;

use emigrant_stats_transform_models::DuplicateYearError;
use thiserror::Error;

pub use filter::YearFilter;
pub use parsing::{CellIssue, ParsePolicy};
pub use pivot::{Pivoted, RawTable};

/// Errors raised when a transform's preconditions do not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Two records of one series share a year.
    #[error("Duplicate year {year} in series")]
    DuplicateYear {
        /// The repeated year.
        year: i32,
    },

    /// Period aggregation was asked for zero-length periods.
    #[error("Period length must be at least one year")]
    InvalidPeriodLength,

    /// A least-squares fit needs at least two distinct x values.
    #[error("Cannot fit a trendline through {points} point(s) without two distinct years")]
    DegenerateRegression {
        /// Number of points supplied.
        points: usize,
    },

    /// A forecast year does not come after the last observed year.
    #[error("Prediction for {year} does not follow the last historical year {last_year}")]
    PredictionOverlap {
        /// Offending forecast year.
        year: i32,
        /// Last year of the historical series.
        last_year: i32,
    },

    /// The identifying column is absent from the table header.
    #[error("Missing identifying column \"{column}\"")]
    MissingColumn {
        /// Expected column name.
        column: String,
    },
}

impl From<DuplicateYearError> for TransformError {
    fn from(e: DuplicateYearError) -> Self {
        Self::DuplicateYear { year: e.year }
    }
}

#[cfg(test)]
mod tests {
    use emigrant_stats_category::definition;
    use emigrant_stats_category::models::Category;

    use super::*;

    fn age_table() -> RawTable {
        let groups = [
            "14 - Below",
            "15 - 19",
            "20 - 24",
            "25 - 29",
            "30 - 34",
            "35 - 39",
            "40 - 44",
            "45 - 49",
            "50 - 54",
            "55 - 59",
            "60 - 64",
            "65 - 69",
            "70 - Above",
            "Not Reported / No Response",
        ];
        let mut headers = vec!["AGE_GROUP".to_string()];
        headers.extend((1981..=2020).map(|y: i32| y.to_string()));
        let rows = groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let mut row = vec![(*group).to_string()];
                let offset = i64::try_from(i).unwrap();
                row.extend((1981..=2020).map(|y: i32| (i64::from(y - 1980) * 10 + offset).to_string()));
                row
            })
            .collect();
        RawTable::new(headers, rows)
    }

    #[test]
    fn age_csv_end_to_end_yields_eight_periods() {
        let def = definition(Category::Age);
        let pivoted =
            pivot::pivot_category_major(&age_table(), &def.identifier_column, ParsePolicy::Strict)
                .unwrap();
        assert!(pivoted.issues.is_empty());
        assert_eq!(pivoted.series.vocabulary().len(), 14);
        assert_eq!(pivoted.series.records().len(), 40);

        let periods = periods::build_periods(
            &pivoted.series,
            def.start_year,
            def.end_year,
            def.period_length.unwrap(),
        )
        .unwrap();
        assert_eq!(periods.len(), 8);
        assert_eq!(periods[0].label, "1981 - 1985");
        assert_eq!(periods[7].label, "2016 - 2020");

        for field in pivoted.series.vocabulary() {
            let by_year: i64 = pivoted.series.records().iter().map(|r| r.get(field)).sum();
            let by_period: i64 = periods.iter().map(|p| p.get(field)).sum();
            assert_eq!(by_year, by_period, "{field}");
        }
    }

    #[test]
    fn education_merge_runs_before_periods() {
        let def = definition(Category::Education);
        let table = RawTable::new(
            vec![
                "EDUCATIONAL ATTAINMENT".to_string(),
                "1988".to_string(),
                "1989".to_string(),
            ],
            vec![
                vec!["Elementary Level".into(), "10".into(), "1".into()],
                vec!["Elementary Graduate".into(), "5".into(), "2".into()],
                vec!["Not Reported".into(), "7".into(), "x".into()],
            ],
        );
        let pivoted =
            pivot::pivot_category_major(&table, &def.identifier_column, ParsePolicy::Permissive)
                .unwrap();
        let merged = mapping::apply_merge(&pivoted.series, &def.merge);
        assert_eq!(merged.get(1988).unwrap().get("Elementary"), 15);
        assert_eq!(merged.get(1989).unwrap().get("Elementary"), 3);
        assert_eq!(merged.get(1989).unwrap().get("Not Reported"), 0);

        let periods = periods::build_periods(&merged, 1988, 1989, 3).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].label, "1988 - 1989");
        assert_eq!(periods[0].get("Elementary"), 18);
    }

    #[test]
    fn duplicate_year_error_converts() {
        let err: TransformError = DuplicateYearError { year: 1999 }.into();
        assert_eq!(err, TransformError::DuplicateYear { year: 1999 });
    }
}

//! Year selection for single-year views such as the destination map.

use std::str::FromStr;

use emigrant_stats_transform_models::TimeSeries;
use serde::{Deserialize, Serialize};

/// Which years of a series feed a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearFilter {
    /// Every year.
    #[default]
    All,
    /// A single year.
    Year(i32),
}

impl YearFilter {
    /// Restricts `series` to the selected years.
    #[must_use]
    pub fn apply(self, series: &TimeSeries) -> TimeSeries {
        match self {
            Self::All => series.clone(),
            Self::Year(year) => series.filtered(|r| r.year == year),
        }
    }
}

impl std::fmt::Display for YearFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

/// Error returned when a year filter string is neither `all` nor a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidYearFilterError(String);

impl std::fmt::Display for InvalidYearFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid year filter \"{}\": expected \"all\" or a year", self.0)
    }
}

impl std::error::Error for InvalidYearFilterError {}

impl FromStr for YearFilter {
    type Err = InvalidYearFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        crate::parsing::parse_year(trimmed)
            .map(Self::Year)
            .ok_or_else(|| InvalidYearFilterError(s.to_string()))
    }
}

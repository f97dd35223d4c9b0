//! Province totals for the origin map.
//!
//! The province feature set splits the National Capital Region into its
//! districts, so the `NCR` pseudo-province has no polygon to join to and is
//! left out of the totals.

use std::collections::BTreeMap;

use emigrant_stats_transform::ranking::field_totals;
use emigrant_stats_transform_models::TimeSeries;
use serde::Serialize;

use crate::normalize_name;

/// Name of the pseudo-province excluded from province joins.
pub const NCR: &str = "NCR";

/// Normalizes a province name, returning `None` for blank names and NCR.
#[must_use]
pub fn province_key(raw: &str) -> Option<String> {
    let name = normalize_name(raw);
    if name.is_empty() || name == NCR {
        None
    } else {
        Some(name)
    }
}

/// Totals per normalized province with their range for the colour scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceTotals {
    /// Normalized province name to total over all years.
    pub totals: BTreeMap<String, i64>,
    /// Smallest total, or `0` with no provinces.
    pub min: i64,
    /// Largest total, or `0` with no provinces.
    pub max: i64,
}

impl ProvinceTotals {
    /// Returns `true` if no province has a total.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Totals each province of `series` over every year.
///
/// Spellings that normalize to the same name are summed.
#[must_use]
pub fn province_totals(series: &TimeSeries) -> ProvinceTotals {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for total in field_totals(series) {
        match province_key(&total.label) {
            Some(name) => {
                let sum = totals.entry(name).or_insert(0);
                *sum = sum.saturating_add(total.total);
            }
            None => log::debug!("Leaving \"{}\" out of province totals", total.label),
        }
    }

    let min = totals.values().copied().min().unwrap_or(0);
    let max = totals.values().copied().max().unwrap_or(0);

    ProvinceTotals { totals, min, max }
}

#[cfg(test)]
mod tests {
    use emigrant_stats_transform_models::{Vocabulary, YearRecord};

    use super::*;

    #[test]
    fn ncr_and_blanks_have_no_key() {
        assert_eq!(province_key("NCR"), None);
        assert_eq!(province_key(" ncr "), None);
        assert_eq!(province_key("NCR (National Capital Region)"), None);
        assert_eq!(province_key(""), None);
        assert_eq!(province_key("Ilocos Norte"), Some("ILOCOS NORTE".to_string()));
    }

    #[test]
    fn totals_exclude_ncr_and_report_range() {
        let series = TimeSeries::new(
            Vocabulary::new(["NCR", "Cebu", "Bohol", "CEBU (Province)"]),
            vec![
                YearRecord::new(1988)
                    .with_field("NCR", 1000)
                    .with_field("Cebu", 10)
                    .with_field("Bohol", 3),
                YearRecord::new(1989)
                    .with_field("Cebu", 5)
                    .with_field("Bohol", 4)
                    .with_field("CEBU (Province)", 1),
            ],
        )
        .unwrap();

        let provinces = province_totals(&series);
        assert!(!provinces.totals.contains_key("NCR"));
        assert_eq!(provinces.totals["CEBU"], 16);
        assert_eq!(provinces.totals["BOHOL"], 7);
        assert_eq!(provinces.min, 7);
        assert_eq!(provinces.max, 16);
    }

    #[test]
    fn duplicate_spellings_saturate() {
        let series = TimeSeries::new(
            Vocabulary::new(["Cebu", "CEBU (Province)"]),
            vec![
                YearRecord::new(1988)
                    .with_field("Cebu", i64::MAX)
                    .with_field("CEBU (Province)", i64::MAX),
            ],
        )
        .unwrap();

        assert_eq!(province_totals(&series).totals["CEBU"], i64::MAX);
    }

    #[test]
    fn empty_series_has_zero_range() {
        let provinces = province_totals(&TimeSeries::default());
        assert!(provinces.is_empty());
        assert_eq!((provinces.min, provinces.max), (0, 0));
    }
}

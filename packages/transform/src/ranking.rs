//! Whole-series totals per field.
//!
//! Totals saturate at the `i64` bounds.

use emigrant_stats_transform_models::{RankedTotal, TimeSeries};

/// Totals each vocabulary field over every year, in vocabulary order.
#[must_use]
pub fn field_totals(series: &TimeSeries) -> Vec<RankedTotal> {
    series
        .vocabulary()
        .iter()
        .map(|field| RankedTotal {
            label: field.clone(),
            total: series
                .records()
                .iter()
                .fold(0i64, |acc, r| acc.saturating_add(r.get(field))),
        })
        .collect()
}

/// Totals each field and sorts descending.
///
/// The sort is stable, so equal totals keep vocabulary order.
#[must_use]
pub fn rank_totals(series: &TimeSeries) -> Vec<RankedTotal> {
    let mut totals = field_totals(series);
    sort_descending(&mut totals);
    totals
}

/// Stable descending sort by total.
pub fn sort_descending(totals: &mut [RankedTotal]) {
    totals.sort_by(|a, b| b.total.cmp(&a.total));
}

#[cfg(test)]
mod tests {
    use emigrant_stats_transform_models::{Vocabulary, YearRecord};

    use super::*;

    fn series() -> TimeSeries {
        TimeSeries::new(
            Vocabulary::new(["Region I", "Region II", "Region III", "Region IV"]),
            vec![
                YearRecord::new(1988)
                    .with_field("Region I", 5)
                    .with_field("Region II", 10)
                    .with_field("Region III", 1),
                YearRecord::new(1989)
                    .with_field("Region I", 5)
                    .with_field("Region III", 9)
                    .with_field("Region IV", 30),
            ],
        )
        .unwrap()
    }

    #[test]
    fn totals_follow_vocabulary_order() {
        let totals = field_totals(&series());
        let pairs: Vec<(&str, i64)> = totals.iter().map(|t| (t.label.as_str(), t.total)).collect();
        assert_eq!(
            pairs,
            [
                ("Region I", 10),
                ("Region II", 10),
                ("Region III", 10),
                ("Region IV", 30)
            ]
        );
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let ranked = rank_totals(&series());
        let labels: Vec<&str> = ranked.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["Region IV", "Region I", "Region II", "Region III"]);
    }

    #[test]
    fn empty_series_ranks_nothing() {
        assert!(rank_totals(&TimeSeries::default()).is_empty());
    }
}

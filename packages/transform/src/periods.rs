//! Fixed-length period aggregation for stacked and grouped charts.

use std::collections::BTreeMap;

use emigrant_stats_transform_models::{PeriodAggregate, TimeSeries};

use crate::TransformError;

/// Sums each vocabulary field over consecutive `length`-year periods.
///
/// Periods start at `start` and step by `length` while the start year is at
/// most `end`. Each period ends at `min(start + length - 1, end)` and is
/// labeled `"{start} - {end}"`, so the last period is clipped rather than
/// running past `end`. Years missing from the series contribute nothing.
///
/// An empty series yields no periods.
///
/// # Errors
///
/// Returns [`TransformError::InvalidPeriodLength`] if `length` is zero.
pub fn build_periods(
    series: &TimeSeries,
    start: i32,
    end: i32,
    length: u32,
) -> Result<Vec<PeriodAggregate>, TransformError> {
    let step = i32::try_from(length)
        .ok()
        .filter(|l| *l > 0)
        .ok_or(TransformError::InvalidPeriodLength)?;

    if series.is_empty() {
        return Ok(Vec::new());
    }

    let mut periods = Vec::new();
    let mut year = start;
    while year <= end {
        let period_end = year.saturating_add(step - 1).min(end);

        let mut fields: BTreeMap<String, i64> = series
            .vocabulary()
            .iter()
            .map(|f| (f.clone(), 0))
            .collect();
        for record in series
            .records()
            .iter()
            .filter(|r| (year..=period_end).contains(&r.year))
        {
            for (field, sum) in &mut fields {
                *sum = sum.saturating_add(record.get(field));
            }
        }

        periods.push(PeriodAggregate {
            label: format!("{year} - {period_end}"),
            start_year: year,
            end_year: period_end,
            fields,
        });

        match year.checked_add(step) {
            Some(next) => year = next,
            None => break,
        }
    }

    Ok(periods)
}

#[cfg(test)]
mod tests {
    use emigrant_stats_transform_models::{Vocabulary, YearRecord};

    use super::*;

    fn series(start: i32, end: i32) -> TimeSeries {
        let records = (start..=end)
            .map(|y| {
                YearRecord::new(y)
                    .with_field("Single", i64::from(y - 1900))
                    .with_field("Married", 2)
            })
            .collect();
        TimeSeries::new(Vocabulary::new(["Single", "Married"]), records).unwrap()
    }

    #[test]
    fn final_period_is_clipped_to_end_year() {
        let periods = build_periods(&series(1988, 2020), 1988, 2020, 3).unwrap();
        assert_eq!(periods.len(), 11);
        assert_eq!(periods[0].label, "1988 - 1990");
        let last = periods.last().unwrap();
        assert_eq!(last.label, "2018 - 2020");
        assert_eq!(last.start_year, 2018);
        assert_eq!(last.end_year, 2020);
    }

    #[test]
    fn uneven_range_produces_short_final_period() {
        let periods = build_periods(&series(1981, 1992), 1981, 1992, 5).unwrap();
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["1981 - 1985", "1986 - 1990", "1991 - 1992"]);
        assert_eq!(periods[2].get("Married"), 4);
    }

    #[test]
    fn sums_are_conserved() {
        let s = series(1988, 2020);
        let periods = build_periods(&s, 1988, 2020, 3).unwrap();
        for field in s.vocabulary() {
            let total: i64 = s.records().iter().map(|r| r.get(field)).sum();
            let by_period: i64 = periods.iter().map(|p| p.get(field)).sum();
            assert_eq!(total, by_period, "{field}");
        }
    }

    #[test]
    fn missing_years_contribute_nothing() {
        let s = TimeSeries::new(
            Vocabulary::new(["A"]),
            vec![YearRecord::new(1990).with_field("A", 7)],
        )
        .unwrap();
        let periods = build_periods(&s, 1988, 1993, 3).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].get("A"), 7);
        assert_eq!(periods[1].get("A"), 0);
        assert!(periods[1].fields.contains_key("A"));
    }

    #[test]
    fn empty_series_gives_no_periods() {
        let periods = build_periods(&TimeSeries::default(), 1981, 2020, 5).unwrap();
        assert!(periods.is_empty());
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(
            build_periods(&series(1981, 1982), 1981, 1982, 0).unwrap_err(),
            TransformError::InvalidPeriodLength
        );
    }
}

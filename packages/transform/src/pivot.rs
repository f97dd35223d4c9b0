//! Pivoting raw CSV tables into year-keyed records.
//!
//! Two source layouts exist. Category-major tables have one row per
//! sub-category and one column per year (`AGE_GROUP,1981,1982,...`);
//! year-major tables have one row per year and one column per sub-category
//! (`YEAR,MALE,FEMALE`). Both pivot into a [`TimeSeries`] whose vocabulary
//! preserves the order the sub-categories appear in the source.

use std::collections::BTreeMap;

use emigrant_stats_transform_models::{TimeSeries, Vocabulary, YearRecord};

use crate::TransformError;
use crate::parsing::{CellIssue, ParsePolicy, parse_count, parse_year};

/// A CSV table as text cells, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header row.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter than the header; missing cells read as
    /// empty.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates a table from a header row and data rows.
    #[must_use]
    pub const fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Finds a column by name, ignoring surrounding whitespace.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }
}

/// Output of a pivot: the series plus any coerced cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivoted {
    /// Year-ordered records.
    pub series: TimeSeries,
    /// Cells that were not clean integers. Always empty under
    /// [`ParsePolicy::Permissive`].
    pub issues: Vec<CellIssue>,
}

struct IssueLog {
    policy: ParsePolicy,
    issues: Vec<CellIssue>,
    coerced: usize,
}

impl IssueLog {
    const fn new(policy: ParsePolicy) -> Self {
        Self {
            policy,
            issues: Vec::new(),
            coerced: 0,
        }
    }

    fn read(&mut self, row: usize, column: &str, raw: &str) -> i64 {
        let parsed = parse_count(raw);
        if !parsed.clean {
            self.coerced += 1;
            if self.policy.collects_issues() {
                self.issues.push(CellIssue {
                    row,
                    column: column.trim().to_string(),
                    raw: raw.to_string(),
                });
            }
        }
        parsed.value
    }

    fn finish(self, series: TimeSeries) -> Pivoted {
        if self.coerced > 0 {
            log::warn!("Coerced {} non-numeric cell(s) while pivoting", self.coerced);
        }
        Pivoted {
            series,
            issues: self.issues,
        }
    }
}

/// Pivots a category-major table.
///
/// Every header other than `identifier_column` that reads as a year becomes
/// one [`YearRecord`]; other headers are skipped. Each row contributes its
/// label as a field, and row order becomes the vocabulary. Rows with a blank
/// label are skipped. A label repeated on a later row overwrites the earlier
/// values.
///
/// # Errors
///
/// * [`TransformError::MissingColumn`] if the identifying column is absent
/// * [`TransformError::DuplicateYear`] if two headers name the same year
pub fn pivot_category_major(
    table: &RawTable,
    identifier_column: &str,
    policy: ParsePolicy,
) -> Result<Pivoted, TransformError> {
    let id_idx = table
        .column_index(identifier_column)
        .ok_or_else(|| TransformError::MissingColumn {
            column: identifier_column.to_string(),
        })?;

    let year_columns: Vec<(usize, i32)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != id_idx)
        .filter_map(|(idx, header)| {
            let year = parse_year(header);
            if year.is_none() {
                log::warn!("Skipping non-year column \"{}\"", header.trim());
            }
            year.map(|y| (idx, y))
        })
        .collect();

    let mut labels = Vec::with_capacity(table.rows.len());
    let mut records: Vec<YearRecord> = year_columns
        .iter()
        .map(|(_, year)| YearRecord::new(*year))
        .collect();
    let mut cells = IssueLog::new(policy);

    for row in 0..table.rows.len() {
        let label = table.cell(row, id_idx).trim();
        if label.is_empty() {
            log::warn!("Skipping row {} with a blank {identifier_column}", row + 1);
            continue;
        }
        if labels.iter().any(|l: &String| l == label) {
            log::warn!("Row label \"{label}\" appears more than once; keeping the last");
        }
        labels.push(label.to_string());

        for (record, (col, _)) in records.iter_mut().zip(&year_columns) {
            let value = cells.read(row, &table.headers[*col], table.cell(row, *col));
            record.fields.insert(label.to_string(), value);
        }
    }

    let series = TimeSeries::new(Vocabulary::new(labels), records)?;
    Ok(cells.finish(series))
}

/// Pivots a year-major table.
///
/// Each row whose identifying cell reads as a year becomes one
/// [`YearRecord`]; other rows are skipped. The vocabulary is `canonical`
/// when given, otherwise the remaining headers in source order. Columns
/// outside a canonical vocabulary are ignored.
///
/// # Errors
///
/// * [`TransformError::MissingColumn`] if the identifying column is absent
/// * [`TransformError::DuplicateYear`] if two rows name the same year
pub fn pivot_year_major(
    table: &RawTable,
    identifier_column: &str,
    canonical: Option<&Vocabulary>,
    policy: ParsePolicy,
) -> Result<Pivoted, TransformError> {
    let id_idx = table
        .column_index(identifier_column)
        .ok_or_else(|| TransformError::MissingColumn {
            column: identifier_column.to_string(),
        })?;

    let mut columns: Vec<(usize, String)> = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        let name = header.trim();
        if idx == id_idx || name.is_empty() {
            continue;
        }
        match canonical {
            Some(vocab) if !vocab.contains(name) => {
                log::warn!("Ignoring column \"{name}\" outside the category vocabulary");
            }
            _ => columns.push((idx, name.to_string())),
        }
    }

    let vocabulary = canonical.map_or_else(
        || Vocabulary::new(columns.iter().map(|(_, name)| name.clone())),
        Clone::clone,
    );

    let mut records = Vec::with_capacity(table.rows.len());
    let mut cells = IssueLog::new(policy);

    for row in 0..table.rows.len() {
        let raw_year = table.cell(row, id_idx);
        let Some(year) = parse_year(raw_year) else {
            log::warn!(
                "Skipping row {} with unreadable {identifier_column} \"{}\"",
                row + 1,
                raw_year.trim()
            );
            continue;
        };

        let fields: BTreeMap<String, i64> = columns
            .iter()
            .map(|(col, name)| (name.clone(), cells.read(row, name, table.cell(row, *col))))
            .collect();
        records.push(YearRecord { year, fields });
    }

    let series = TimeSeries::new(vocabulary, records)?;
    Ok(cells.finish(series))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(ToString::to_string).collect(),
            rows.iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
        )
    }

    #[test]
    fn category_major_round_trips_each_year() {
        let t = table(
            &["AGE_GROUP", "1981", "1982"],
            &[&["15 - 19", "100", "110"], &["20 - 24", "200", "220"]],
        );
        let pivoted = pivot_category_major(&t, "AGE_GROUP", ParsePolicy::Strict).unwrap();
        let series = pivoted.series;

        assert_eq!(series.vocabulary().fields(), ["15 - 19", "20 - 24"]);
        for (col, year) in [(1, 1981), (2, 1982)] {
            let record = series.get(year).unwrap();
            for row in &t.rows {
                assert_eq!(record.get(&row[0]), row[col].parse::<i64>().unwrap());
            }
            let row_sum: i64 = t.rows.iter().map(|r| r[col].parse::<i64>().unwrap()).sum();
            assert_eq!(record.fields.values().sum::<i64>(), row_sum);
        }
    }

    #[test]
    fn category_major_trims_headers_and_skips_non_year_columns() {
        let t = table(
            &[" REGION ", "1988 ", "NOTES"],
            &[&["Region I", "5", "x"], &["", "9", ""]],
        );
        let pivoted = pivot_category_major(&t, "REGION", ParsePolicy::Permissive).unwrap();
        assert_eq!(pivoted.series.records().len(), 1);
        assert_eq!(pivoted.series.vocabulary().fields(), ["Region I"]);
        assert_eq!(pivoted.series.get(1988).unwrap().get("Region I"), 5);
    }

    #[test]
    fn category_major_coerces_dirty_cells() {
        let t = table(&["COUNTRY", "1990"], &[&["JAPAN", "abc"], &["CANADA", "1,200"]]);

        let permissive = pivot_category_major(&t, "COUNTRY", ParsePolicy::Permissive).unwrap();
        assert!(permissive.issues.is_empty());
        let record = permissive.series.get(1990).unwrap();
        assert_eq!(record.get("JAPAN"), 0);
        assert_eq!(record.get("CANADA"), 1);

        let strict = pivot_category_major(&t, "COUNTRY", ParsePolicy::Strict).unwrap();
        assert_eq!(strict.issues.len(), 2);
        assert_eq!(strict.issues[0].row, 0);
        assert_eq!(strict.issues[0].column, "1990");
        assert_eq!(strict.issues[1].raw, "1,200");
        assert_eq!(strict.series, permissive.series);
    }

    #[test]
    fn short_rows_read_missing_cells_as_zero() {
        let t = table(&["COUNTRY", "1990", "1991"], &[&["JAPAN", "4"]]);
        let pivoted = pivot_category_major(&t, "COUNTRY", ParsePolicy::Permissive).unwrap();
        assert_eq!(pivoted.series.get(1991).unwrap().get("JAPAN"), 0);
    }

    #[test]
    fn missing_identifier_column_is_an_error() {
        let t = table(&["1990"], &[&["4"]]);
        assert_eq!(
            pivot_category_major(&t, "AGE_GROUP", ParsePolicy::Permissive).unwrap_err(),
            TransformError::MissingColumn {
                column: "AGE_GROUP".to_string()
            }
        );
    }

    #[test]
    fn duplicate_year_headers_are_rejected() {
        let t = table(&["REGION", "1990", "1990"], &[&["Region I", "1", "2"]]);
        assert_eq!(
            pivot_category_major(&t, "REGION", ParsePolicy::Permissive).unwrap_err(),
            TransformError::DuplicateYear { year: 1990 }
        );
    }

    #[test]
    fn empty_table_gives_empty_series() {
        let t = table(&["AGE_GROUP"], &[]);
        let pivoted = pivot_category_major(&t, "AGE_GROUP", ParsePolicy::Permissive).unwrap();
        assert!(pivoted.series.is_empty());
    }

    #[test]
    fn year_major_uses_source_column_order() {
        let t = table(
            &["YEAR", "USA", "CANADA", "JAPAN"],
            &[&["1982", "2", "3", "4"], &["1981", "1", "1", "1"]],
        );
        let pivoted = pivot_year_major(&t, "YEAR", None, ParsePolicy::Permissive).unwrap();
        assert_eq!(
            pivoted.series.vocabulary().fields(),
            ["USA", "CANADA", "JAPAN"]
        );
        assert_eq!(pivoted.series.first_year(), Some(1981));
        assert_eq!(pivoted.series.get(1982).unwrap().get("JAPAN"), 4);
    }

    #[test]
    fn year_major_prefers_canonical_vocabulary() {
        let vocab = Vocabulary::new(["MALE", "FEMALE"]);
        let t = table(
            &["YEAR", "FEMALE", "MALE", "TOTAL"],
            &[&["1981", "30", "50", "80"], &["Total", "1", "1", "2"]],
        );
        let pivoted = pivot_year_major(&t, "YEAR", Some(&vocab), ParsePolicy::Strict).unwrap();
        assert_eq!(pivoted.series.vocabulary(), &vocab);
        assert_eq!(pivoted.series.records().len(), 1);
        let record = pivoted.series.get(1981).unwrap();
        assert_eq!(record.get("MALE"), 50);
        assert_eq!(record.get("FEMALE"), 30);
        assert!(!record.fields.contains_key("TOTAL"));
        assert!(pivoted.issues.is_empty());
    }

    #[test]
    fn year_major_rejects_duplicate_years() {
        let t = table(&["YEAR", "MALE"], &[&["1981", "1"], &["1981", "2"]]);
        assert_eq!(
            pivot_year_major(&t, "YEAR", None, ParsePolicy::Permissive).unwrap_err(),
            TransformError::DuplicateYear { year: 1981 }
        );
    }
}

//! Cell-level count parsing.
//!
//! Source spreadsheets are hand-maintained and carry stray text, thousands
//! separators, and blank cells. Counts are read by their leading integer
//! (`"12.7"` → 12, `"1,234"` → 1) and anything without one reads as zero.
//! [`ParsePolicy::Strict`] keeps that behaviour but records every cell that
//! was not a clean integer so the caller can reject or report the upload.

use serde::Serialize;

/// How pivoting treats cells that are not clean integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Coerce silently to the leading integer, or zero.
    #[default]
    Permissive,
    /// Coerce as in permissive mode and collect a [`CellIssue`] per cell.
    Strict,
}

impl ParsePolicy {
    /// Returns `true` if coerced cells should be recorded.
    #[must_use]
    pub const fn collects_issues(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// A cell whose raw text was not a clean integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellIssue {
    /// Zero-based data row index (the header row is not counted).
    pub row: usize,
    /// Header of the cell's column.
    pub column: String,
    /// Raw cell text.
    pub raw: String,
}

impl std::fmt::Display for CellIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}, column \"{}\": \"{}\" is not a whole number",
            self.row + 1,
            self.column,
            self.raw
        )
    }
}

/// Result of parsing one count cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCount {
    /// The value to store.
    pub value: i64,
    /// `false` if the raw text had to be coerced.
    pub clean: bool,
}

/// Parses a count cell.
///
/// Leading whitespace and a single sign are accepted, then digits up to the
/// first non-digit. No digits at all gives zero. Values beyond `i64`
/// saturate. The cell is clean only if the trimmed text is an optionally
/// signed run of digits.
#[must_use]
pub fn parse_count(raw: &str) -> ParsedCount {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let leading = digits.bytes().take_while(u8::is_ascii_digit).count();
    if leading == 0 {
        return ParsedCount {
            value: 0,
            clean: false,
        };
    }

    let magnitude = digits[..leading].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });

    ParsedCount {
        value: if negative { -magnitude } else { magnitude },
        clean: leading == digits.len(),
    }
}

/// Parses a header or identifier cell as a calendar year.
///
/// Unlike counts, years must be clean: `"1988"` parses, `"1988 (rev)"` does
/// not.
#[must_use]
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_integers() {
        assert_eq!(
            parse_count("1234"),
            ParsedCount {
                value: 1234,
                clean: true
            }
        );
        assert_eq!(parse_count("  42 ").value, 42);
        assert!(parse_count("  42 ").clean);
        assert_eq!(parse_count("-7").value, -7);
        assert_eq!(parse_count("+7").value, 7);
    }

    #[test]
    fn takes_leading_integer_of_dirty_cells() {
        let decimal = parse_count("12.7");
        assert_eq!(decimal.value, 12);
        assert!(!decimal.clean);

        let separated = parse_count("1,234");
        assert_eq!(separated.value, 1);
        assert!(!separated.clean);
    }

    #[test]
    fn non_numeric_cells_read_as_zero() {
        for raw in ["", "   ", "abc", "-", "N/A"] {
            let parsed = parse_count(raw);
            assert_eq!(parsed.value, 0, "{raw:?}");
            assert!(!parsed.clean, "{raw:?}");
        }
    }

    #[test]
    fn huge_values_saturate() {
        assert_eq!(parse_count("99999999999999999999999").value, i64::MAX);
    }

    #[test]
    fn saturated_cells_total_without_overflow() {
        let table = crate::RawTable::new(
            vec!["COUNTRY".to_string(), "1990".to_string(), "1991".to_string()],
            vec![
                vec![
                    "JAPAN".to_string(),
                    "99999999999999999999".to_string(),
                    "5".to_string(),
                ],
                vec![
                    "USA".to_string(),
                    "99999999999999999999".to_string(),
                    "99999999999999999999".to_string(),
                ],
            ],
        );
        let pivoted = crate::pivot::pivot_category_major(&table, "COUNTRY", ParsePolicy::Permissive)
            .unwrap();

        let totals = crate::ranking::field_totals(&pivoted.series);
        assert_eq!(totals[0].total, i64::MAX);
        assert_eq!(totals[1].total, i64::MAX);

        let periods = crate::periods::build_periods(&pivoted.series, 1990, 1991, 5).unwrap();
        assert_eq!(periods[0].get("USA"), i64::MAX);

        let tier = crate::choropleth::classify(totals[1].total);
        assert_eq!(tier, crate::choropleth::classify(1_000_000));
    }

    #[test]
    fn years_must_be_clean() {
        assert_eq!(parse_year("1988"), Some(1988));
        assert_eq!(parse_year(" 2020 "), Some(2020));
        assert_eq!(parse_year("AGE_GROUP"), None);
        assert_eq!(parse_year("1988a"), None);
        assert_eq!(parse_year("-1988"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn strict_policy_collects_issues() {
        assert!(ParsePolicy::Strict.collects_issues());
        assert!(!ParsePolicy::default().collects_issues());
    }

    #[test]
    fn cell_issue_display_is_one_based() {
        let issue = CellIssue {
            row: 0,
            column: "1990".to_string(),
            raw: "n/a".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "row 1, column \"1990\": \"n/a\" is not a whole number"
        );
    }
}

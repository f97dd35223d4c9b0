#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Joins category totals to map features.
//!
//! Destination countries are matched to ISO 3166-1 alpha-3 codes, the ids
//! used by the world country feature set. Province names are normalized so
//! spreadsheet spellings line up with the province feature set.

pub mod countries;
pub mod provinces;

use std::sync::LazyLock;

use regex::Regex;

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a place name for joining: uppercase, trim, drop parenthetical
/// notes, and collapse runs of whitespace.
///
/// `"  Cotabato (North Cotabato) "` becomes `"COTABATO"`.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let stripped = PARENTHETICAL.replace_all(upper.trim(), " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_name("  davao   del sur "), "DAVAO DEL SUR");
    }

    #[test]
    fn strips_parenthetical_notes() {
        assert_eq!(normalize_name("Cotabato (North Cotabato)"), "COTABATO");
        assert_eq!(
            normalize_name("Samar (Western Samar) Province"),
            "SAMAR PROVINCE"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_name("   "), "");
    }
}

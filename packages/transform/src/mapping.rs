//! Composite sub-categories.
//!
//! Some categories publish finer labels than the charts show (for example
//! `Elementary Level` and `Elementary Graduate`). A merge table maps each
//! aggregate label to its raw labels; raw labels that no rule covers pass
//! through unchanged. Apply the table before any period aggregation so
//! chart and period series agree.

use std::collections::BTreeMap;

use emigrant_stats_category_models::MergeRule;
use emigrant_stats_transform_models::{TimeSeries, Vocabulary, YearRecord};

fn is_covered(rules: &[MergeRule], raw: &str) -> bool {
    let raw = raw.trim();
    rules
        .iter()
        .any(|rule| rule.sources.iter().any(|s| s.trim() == raw))
}

/// Vocabulary after merging: aggregate labels in rule order, then the
/// uncovered raw labels in their original order.
#[must_use]
pub fn merged_vocabulary(raw: &Vocabulary, rules: &[MergeRule]) -> Vocabulary {
    Vocabulary::new(
        rules
            .iter()
            .map(|rule| rule.label.trim().to_string())
            .chain(
                raw.iter()
                    .filter(|f| !is_covered(rules, f))
                    .map(|f| f.trim().to_string()),
            ),
    )
}

/// Merges the fields of one record.
///
/// Each aggregate is the sum of its raw fields; a missing raw field
/// contributes zero. Uncovered fields are copied under their trimmed name.
#[must_use]
pub fn merge_record(record: &YearRecord, rules: &[MergeRule]) -> BTreeMap<String, i64> {
    let trimmed: BTreeMap<&str, i64> = record
        .fields
        .iter()
        .map(|(k, v)| (k.trim(), *v))
        .collect();

    let mut fields: BTreeMap<String, i64> = rules
        .iter()
        .map(|rule| {
            let sum = rule
                .sources
                .iter()
                .map(|s| trimmed.get(s.trim()).copied().unwrap_or(0))
                .fold(0i64, i64::saturating_add);
            (rule.label.trim().to_string(), sum)
        })
        .collect();

    for (name, value) in trimmed {
        if !is_covered(rules, name) {
            let sum = fields.entry(name.to_string()).or_insert(0);
            *sum = sum.saturating_add(value);
        }
    }

    fields
}

/// Applies a merge table to every record of a series.
///
/// With no rules the series is returned unchanged.
#[must_use]
pub fn apply_merge(series: &TimeSeries, rules: &[MergeRule]) -> TimeSeries {
    if rules.is_empty() {
        return series.clone();
    }
    series.remap_fields(merged_vocabulary(series.vocabulary(), rules), |r| {
        merge_record(r, rules)
    })
}

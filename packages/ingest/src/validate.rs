//! Structural checks run before any transform.

use emigrant_stats_category_models::{CategoryDefinition, Layout};
use emigrant_stats_transform::RawTable;
use emigrant_stats_transform::parsing::parse_year;

/// Lists every structural requirement `table` fails for `def`.
///
/// Cell contents are not inspected here; non-numeric cells are a parse
/// concern. An empty list means the table can be pivoted.
#[must_use]
pub fn structural_problems(def: &CategoryDefinition, table: &RawTable) -> Vec<String> {
    let mut problems = Vec::new();

    let Some(id_idx) = table.column_index(&def.identifier_column) else {
        problems.push(format!("Must have \"{}\" column", def.identifier_column));
        return problems;
    };

    if table.is_empty() {
        problems.push("File contains no data rows".to_string());
        return problems;
    }

    match def.layout {
        Layout::CategoryMajor => {
            let years: Vec<i32> = table
                .headers
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != id_idx)
                .filter_map(|(_, h)| parse_year(h))
                .collect();
            if years.is_empty() {
                problems.push("Year columns must be numeric".to_string());
            }
            if let Some(year) = years
                .iter()
                .find(|y| !(def.start_year..=def.end_year).contains(*y))
            {
                log::warn!(
                    "{}: year column {year} is outside {}-{}",
                    def.id,
                    def.start_year,
                    def.end_year
                );
            }

            let labeled = table
                .rows
                .iter()
                .filter(|row| row.get(id_idx).is_some_and(|c| !c.trim().is_empty()))
                .count();
            if let Some(expected) = def.expected_fields
                && labeled < expected
            {
                problems.push(format!(
                    "{expected} {} rows required, found {labeled}",
                    def.identifier_column
                ));
            }
        }
        Layout::YearMajor => {
            for field in &def.vocabulary {
                if table.column_index(field).is_none() {
                    problems.push(format!("Must have \"{field}\" column"));
                }
            }
            let other_columns = table
                .headers
                .iter()
                .enumerate()
                .filter(|(idx, h)| *idx != id_idx && !h.trim().is_empty())
                .count();
            if let Some(expected) = def.expected_fields
                && other_columns < expected
            {
                problems.push(format!(
                    "{expected} columns besides {} required, found {other_columns}",
                    def.identifier_column
                ));
            }
            let dated = table
                .rows
                .iter()
                .filter(|row| row.get(id_idx).is_some_and(|c| parse_year(c).is_some()))
                .count();
            if dated == 0 {
                problems.push(format!("{} values must be years", def.identifier_column));
            }
        }
    }

    problems
}

//! The stored form of one category.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use emigrant_stats_transform_models::{Vocabulary, YearRecord};
use serde::{Deserialize, Serialize};

/// All records of one category, keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDocument {
    /// Source-order vocabulary saved by the last upload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vocabulary>,
    /// Year to field values.
    #[serde(default)]
    pub records: BTreeMap<i32, BTreeMap<String, i64>>,
}

impl CategoryDocument {
    /// Records in ascending year order.
    #[must_use]
    pub fn all(&self) -> Vec<YearRecord> {
        self.records
            .iter()
            .map(|(year, fields)| YearRecord {
                year: *year,
                fields: fields.clone(),
            })
            .collect()
    }

    /// The record for `year`, if any.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<YearRecord> {
        self.records.get(&year).map(|fields| YearRecord {
            year,
            fields: fields.clone(),
        })
    }

    /// Creates or replaces the record for `record.year`.
    pub fn upsert(&mut self, record: YearRecord) {
        self.records.insert(record.year, record.fields);
    }

    /// Adds the record for `record.year` unless that year already has one.
    /// Returns whether it was added.
    pub fn insert_new(&mut self, record: YearRecord) -> bool {
        match self.records.entry(record.year) {
            Entry::Vacant(slot) => {
                slot.insert(record.fields);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Applies a whole upload: the vocabulary, if given, and every record.
    pub fn import(&mut self, vocabulary: Option<Vocabulary>, records: Vec<YearRecord>) {
        if vocabulary.is_some() {
            self.vocabulary = vocabulary;
        }
        for record in records {
            self.upsert(record);
        }
    }

    /// Removes the record for `year`, returning whether one existed.
    pub fn delete(&mut self, year: i32) -> bool {
        self.records.remove(&year).is_some()
    }

    /// Removes every record, returning how many there were.
    ///
    /// The saved vocabulary is kept.
    pub fn delete_all(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }
}

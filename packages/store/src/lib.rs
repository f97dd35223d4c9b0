#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record storage for emigrant statistics.
//!
//! Each category is stored as one record per year. The [`RecordStore`]
//! trait is the contract the dashboard and ingestion code depend on; the
//! crate ships an in-memory implementation for tests and a JSON file
//! implementation for local use.

pub mod document;
pub mod json_file;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use emigrant_stats_category_models::Category;
use emigrant_stats_transform_models::{Vocabulary, YearRecord};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Environment variable naming the JSON store directory.
pub const DATA_DIR_ENV: &str = "EMIGRANT_STATS_DATA_DIR";

/// Store directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data/store";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An "add new" write targeted a year that already has a record.
    #[error("Data for year {year} already exists in {category}; edit it instead")]
    Conflict {
        /// Category written to.
        category: Category,
        /// Existing year.
        year: i32,
    },
}

impl StoreError {
    /// Returns `true` if retrying the operation could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Per-category storage of year records.
///
/// Implementations must return records from [`get_all`](Self::get_all) in
/// ascending year order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record of `category`, ascending by year.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    async fn get_all(&self, category: Category) -> Result<Vec<YearRecord>, StoreError>;

    /// Returns the record of `category` for `year`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    async fn get_by_year(
        &self,
        category: Category,
        year: i32,
    ) -> Result<Option<YearRecord>, StoreError>;

    /// Adds a record for a year that has none yet.
    ///
    /// The existence check and the write happen as one step, so of two
    /// concurrent adds for the same year exactly one succeeds.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Conflict`] if `category` already has a record for
    ///   `record.year`
    /// * [`StoreError`] if the backing storage cannot be read or written
    async fn add_new(&self, category: Category, record: YearRecord) -> Result<(), StoreError>;

    /// Creates or replaces the record for `record.year`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn upsert(&self, category: Category, record: YearRecord) -> Result<(), StoreError>;

    /// Deletes the record for `year`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn delete(&self, category: Category, year: i32) -> Result<bool, StoreError>;

    /// Deletes every record of `category`, returning how many there were.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn delete_all(&self, category: Category) -> Result<usize, StoreError>;

    /// Returns the source-order vocabulary saved for `category`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    async fn vocabulary(&self, category: Category) -> Result<Option<Vocabulary>, StoreError>;

    /// Saves the source-order vocabulary for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn set_vocabulary(
        &self,
        category: Category,
        vocabulary: Vocabulary,
    ) -> Result<(), StoreError>;

    /// Writes an upload in one step: every record, replacing existing
    /// years, and the vocabulary when one is given. On error nothing of the
    /// upload is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn import(
        &self,
        category: Category,
        vocabulary: Option<Vocabulary>,
        records: Vec<YearRecord>,
    ) -> Result<(), StoreError>;
}

/// Returns the store directory from [`DATA_DIR_ENV`], falling back to
/// [`DEFAULT_DATA_DIR`].
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    std::env::var(DATA_DIR_ENV).map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

/// Opens the JSON file store in the directory named by the environment.
#[must_use]
pub fn open_from_env() -> JsonFileStore {
    let dir = data_dir_from_env();
    log::info!("Using record store at {}", dir.display());
    JsonFileStore::new(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_new_refuses_existing_year() {
        let store = MemoryStore::new();
        let record = YearRecord::new(2020).with_field("MALE", 1);

        store.add_new(Category::Sex, record.clone()).await.unwrap();
        let err = store.add_new(Category::Sex, record).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                category: Category::Sex,
                year: 2020
            }
        ));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Data for year 2020 already exists in sex; edit it instead"
        );
    }

    #[tokio::test]
    async fn add_new_is_scoped_per_category() {
        let store = MemoryStore::new();
        store
            .add_new(Category::Sex, YearRecord::new(2020))
            .await
            .unwrap();
        store
            .add_new(Category::Age, YearRecord::new(2020))
            .await
            .unwrap();
        assert_eq!(store.get_all(Category::Age).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_adds_for_one_year_conflict() {
        let store = MemoryStore::new();
        let (first, second) = tokio::join!(
            store.add_new(Category::Sex, YearRecord::new(1990).with_field("MALE", 1)),
            store.add_new(Category::Sex, YearRecord::new(1990).with_field("MALE", 2)),
        );
        assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
        let loser = first.err().or(second.err()).unwrap();
        assert!(matches!(loser, StoreError::Conflict { year: 1990, .. }));
    }

    #[test]
    fn io_errors_are_retryable() {
        let err = StoreError::from(std::io::Error::other("disk gone"));
        assert!(err.is_retryable());
    }
}

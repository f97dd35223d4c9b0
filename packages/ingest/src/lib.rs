#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Uploads a category CSV into the record store.
//!
//! Ingestion reads the CSV, checks its structure against the category
//! definition, pivots it into one record per year, and writes each year to
//! the store. Structural problems are reported together before anything is
//! written.

pub mod reader;
pub mod validate;

use std::path::Path;

use emigrant_stats_category_models::{CategoryDefinition, Layout};
use emigrant_stats_store::{RecordStore, StoreError};
use emigrant_stats_transform::pivot::{pivot_category_major, pivot_year_major};
use emigrant_stats_transform::{CellIssue, ParsePolicy, RawTable, TransformError};
use emigrant_stats_transform_models::Vocabulary;

/// Errors that can occur during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The table does not have the structure the category needs.
    #[error("Invalid CSV format: {}", problems.join("; "))]
    Validation {
        /// Human-readable list of unmet requirements.
        problems: Vec<String>,
    },

    /// Strict parsing found cells that are not whole numbers.
    #[error("{} cell(s) are not whole numbers, first at {}", issues.len(), issues.first().map(ToString::to_string).unwrap_or_default())]
    InvalidCells {
        /// Every offending cell.
        issues: Vec<CellIssue>,
    },

    /// Pivoting failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Writing to the store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Summary of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of year records written.
    pub years_written: usize,
    /// First year written, if any.
    pub first_year: Option<i32>,
    /// Last year written, if any.
    pub last_year: Option<i32>,
    /// Vocabulary of the uploaded table.
    pub vocabulary: Vocabulary,
}

impl IngestReport {
    /// One-line message for the uploader.
    #[must_use]
    pub fn message(&self) -> String {
        match (self.first_year, self.last_year) {
            (Some(first), Some(last)) => format!(
                "Uploaded {} year(s) of data ({first}-{last})",
                self.years_written
            ),
            _ => "No year records found in file".to_string(),
        }
    }
}

/// Ingests an already-read table.
///
/// Categories without a canonical vocabulary also save the table's
/// source-order vocabulary so later loads keep that order.
///
/// # Errors
///
/// * [`IngestError::Validation`] if the table's structure is wrong
/// * [`IngestError::InvalidCells`] under [`ParsePolicy::Strict`] if any
///   cell is not a whole number
/// * [`IngestError::Transform`] if pivoting fails
/// * [`IngestError::Store`] if the write fails; the upload is written as
///   one [`RecordStore::import`], so a failed write stores none of it
pub async fn ingest_table(
    store: &dyn RecordStore,
    def: &CategoryDefinition,
    table: &RawTable,
    policy: ParsePolicy,
) -> Result<IngestReport, IngestError> {
    let problems = validate::structural_problems(def, table);
    if !problems.is_empty() {
        log::warn!("{}: rejected upload: {}", def.id, problems.join("; "));
        return Err(IngestError::Validation { problems });
    }

    let pivoted = match def.layout {
        Layout::CategoryMajor => pivot_category_major(table, &def.identifier_column, policy)?,
        Layout::YearMajor => {
            let canonical = Vocabulary::new(def.vocabulary.iter().cloned());
            pivot_year_major(
                table,
                &def.identifier_column,
                def.has_canonical_vocabulary().then_some(&canonical),
                policy,
            )?
        }
    };

    if !pivoted.issues.is_empty() {
        log::warn!(
            "{}: rejected upload with {} non-numeric cell(s)",
            def.id,
            pivoted.issues.len()
        );
        return Err(IngestError::InvalidCells {
            issues: pivoted.issues,
        });
    }

    let series = pivoted.series;
    let report = IngestReport {
        years_written: series.records().len(),
        first_year: series.first_year(),
        last_year: series.last_year(),
        vocabulary: series.vocabulary().clone(),
    };

    let (vocabulary, records) = series.into_parts();
    let vocabulary = (!def.has_canonical_vocabulary()).then_some(vocabulary);
    store.import(def.id, vocabulary, records).await?;

    log::info!("{}: {}", def.id, report.message());

    Ok(report)
}

/// Ingests CSV bytes.
///
/// # Errors
///
/// As [`ingest_table`], plus [`IngestError::Csv`] for malformed CSV.
pub async fn ingest_csv(
    store: &dyn RecordStore,
    def: &CategoryDefinition,
    bytes: &[u8],
    policy: ParsePolicy,
) -> Result<IngestReport, IngestError> {
    let table = reader::read_csv(bytes)?;
    ingest_table(store, def, &table, policy).await
}

/// Ingests a CSV file from disk.
///
/// # Errors
///
/// As [`ingest_csv`], plus [`IngestError::Io`] if the file cannot be read.
pub async fn ingest_file(
    store: &dyn RecordStore,
    def: &CategoryDefinition,
    path: &Path,
    policy: ParsePolicy,
) -> Result<IngestReport, IngestError> {
    log::info!("{}: reading {}", def.id, path.display());
    let bytes = tokio::fs::read(path).await?;
    ingest_csv(store, def, &bytes, policy).await
}

#[cfg(test)]
mod tests {
    use emigrant_stats_category::definition;
    use emigrant_stats_category_models::Category;
    use emigrant_stats_store::MemoryStore;
    use emigrant_stats_transform_models::YearRecord;

    use super::*;

    const SEX_CSV: &[u8] = b"YEAR,MALE,FEMALE\n1981,100,150\n1982,110,160\n";

    #[tokio::test]
    async fn writes_one_record_per_year() {
        let store = MemoryStore::new();
        let def = definition(Category::Sex);
        let report = ingest_csv(&store, &def, SEX_CSV, ParsePolicy::Permissive)
            .await
            .unwrap();

        assert_eq!(report.years_written, 2);
        assert_eq!(report.message(), "Uploaded 2 year(s) of data (1981-1982)");
        let records = store.get_all(Category::Sex).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("FEMALE"), 160);
        assert!(store.vocabulary(Category::Sex).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saves_source_vocabulary_when_not_canonical() {
        let store = MemoryStore::new();
        let def = definition(Category::AllDestination);
        let csv = b"COUNTRY,1981,1982\nJAPAN,1,2\nCANADA,3,4\n";
        ingest_csv(&store, &def, csv, ParsePolicy::Permissive)
            .await
            .unwrap();
        assert_eq!(
            store.vocabulary(Category::AllDestination).await.unwrap(),
            Some(Vocabulary::new(["JAPAN", "CANADA"]))
        );
    }

    #[tokio::test]
    async fn validation_failure_writes_nothing() {
        let store = MemoryStore::new();
        let def = definition(Category::Sex);
        let err = ingest_csv(&store, &def, b"YEAR,MALE\n1981,1\n", ParsePolicy::Permissive)
            .await
            .unwrap_err();
        match err {
            IngestError::Validation { problems } => {
                assert_eq!(problems, ["Must have \"FEMALE\" column"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.get_all(Category::Sex).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_mode_rejects_dirty_cells() {
        let store = MemoryStore::new();
        let def = definition(Category::Sex);
        let csv = b"YEAR,MALE,FEMALE\n1981,1.5,2\n1982,n/a,3\n";

        let err = ingest_csv(&store, &def, csv, ParsePolicy::Strict)
            .await
            .unwrap_err();
        let IngestError::InvalidCells { issues } = err else {
            panic!("expected invalid cells");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1].column, "MALE");
        assert!(store.get_all(Category::Sex).await.unwrap().is_empty());

        let report = ingest_csv(&store, &def, csv, ParsePolicy::Permissive)
            .await
            .unwrap();
        assert_eq!(report.years_written, 2);
        let first = store.get_by_year(Category::Sex, 1981).await.unwrap().unwrap();
        assert_eq!(first.get("MALE"), 1);
    }

    #[tokio::test]
    async fn reingesting_overwrites_years() {
        let store = MemoryStore::new();
        let def = definition(Category::Sex);
        ingest_csv(&store, &def, SEX_CSV, ParsePolicy::Permissive)
            .await
            .unwrap();
        ingest_csv(
            &store,
            &def,
            b"YEAR,MALE,FEMALE\n1982,1,1\n",
            ParsePolicy::Permissive,
        )
        .await
        .unwrap();
        let records = store.get_all(Category::Sex).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("MALE"), 1);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let store = MemoryStore::new();
        let def = definition(Category::Sex);
        let err = ingest_file(
            &store,
            &def,
            Path::new("/nonexistent/emigrant_stats/sex.csv"),
            ParsePolicy::Permissive,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }

    /// Accepts reads but fails every upload write.
    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl RecordStore for ReadOnlyStore {
        async fn get_all(&self, _category: Category) -> Result<Vec<YearRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_by_year(
            &self,
            _category: Category,
            _year: i32,
        ) -> Result<Option<YearRecord>, StoreError> {
            Ok(None)
        }

        async fn add_new(&self, _category: Category, _record: YearRecord) -> Result<(), StoreError> {
            unreachable!("uploads do not add single years")
        }

        async fn upsert(&self, _category: Category, _record: YearRecord) -> Result<(), StoreError> {
            unreachable!("uploads are written in one step")
        }

        async fn delete(&self, _category: Category, _year: i32) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn delete_all(&self, _category: Category) -> Result<usize, StoreError> {
            Ok(0)
        }

        async fn vocabulary(&self, _category: Category) -> Result<Option<Vocabulary>, StoreError> {
            Ok(None)
        }

        async fn set_vocabulary(
            &self,
            _category: Category,
            _vocabulary: Vocabulary,
        ) -> Result<(), StoreError> {
            unreachable!("uploads are written in one step")
        }

        async fn import(
            &self,
            _category: Category,
            _vocabulary: Option<Vocabulary>,
            _records: Vec<YearRecord>,
        ) -> Result<(), StoreError> {
            Err(std::io::Error::other("read-only file system").into())
        }
    }

    #[tokio::test]
    async fn failed_write_is_reported_as_one_store_error() {
        let def = definition(Category::AllDestination);
        let csv = b"COUNTRY,1981,1982\nJAPAN,1,2\nCANADA,3,4\n";
        let err = ingest_csv(&ReadOnlyStore, &def, csv, ParsePolicy::Permissive)
            .await
            .unwrap_err();
        let IngestError::Store(e) = err else {
            panic!("expected a store error");
        };
        assert!(e.is_retryable());
    }
}

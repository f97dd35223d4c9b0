//! [`RecordStore`] backed by one JSON file per category.
//!
//! Every write rewrites the whole category file: the document is written to
//! a sibling temporary file and renamed over the original, so a reader never
//! sees a half-written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use emigrant_stats_category_models::Category;
use emigrant_stats_transform_models::{Vocabulary, YearRecord};
use tokio::sync::Mutex;

use crate::document::CategoryDocument;
use crate::{RecordStore, StoreError};

/// A [`RecordStore`] that keeps `<dir>/<category>.json` files.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{category}.json"))
    }

    async fn load(&self, category: Category) -> Result<CategoryDocument, StoreError> {
        let path = self.path_for(category);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CategoryDocument::default()),
            Err(e) => {
                log::error!("Failed to read {}: {e}", path.display());
                Err(e.into())
            }
        }
    }

    async fn save(&self, category: Category, doc: &CategoryDocument) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(category);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!(
            "Saved {} record(s) to {}",
            doc.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Loads, edits, and saves one category under the write lock. Nothing
    /// is saved if `edit` fails.
    async fn update<T: Send>(
        &self,
        category: Category,
        edit: impl FnOnce(&mut CategoryDocument) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(category).await?;
        let result = edit(&mut doc)?;
        self.save(category, &doc).await?;
        Ok(result)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get_all(&self, category: Category) -> Result<Vec<YearRecord>, StoreError> {
        Ok(self.load(category).await?.all())
    }

    async fn get_by_year(
        &self,
        category: Category,
        year: i32,
    ) -> Result<Option<YearRecord>, StoreError> {
        Ok(self.load(category).await?.get(year))
    }

    async fn add_new(&self, category: Category, record: YearRecord) -> Result<(), StoreError> {
        let year = record.year;
        self.update(category, |doc| {
            if doc.insert_new(record) {
                Ok(())
            } else {
                Err(StoreError::Conflict { category, year })
            }
        })
        .await
    }

    async fn upsert(&self, category: Category, record: YearRecord) -> Result<(), StoreError> {
        self.update(category, |doc| {
            doc.upsert(record);
            Ok(())
        })
        .await
    }

    async fn delete(&self, category: Category, year: i32) -> Result<bool, StoreError> {
        self.update(category, |doc| Ok(doc.delete(year))).await
    }

    async fn delete_all(&self, category: Category) -> Result<usize, StoreError> {
        self.update(category, |doc| Ok(doc.delete_all())).await
    }

    async fn vocabulary(&self, category: Category) -> Result<Option<Vocabulary>, StoreError> {
        Ok(self.load(category).await?.vocabulary)
    }

    async fn set_vocabulary(
        &self,
        category: Category,
        vocabulary: Vocabulary,
    ) -> Result<(), StoreError> {
        self.update(category, |doc| {
            doc.vocabulary = Some(vocabulary);
            Ok(())
        })
        .await
    }

    async fn import(
        &self,
        category: Category,
        vocabulary: Option<Vocabulary>,
        records: Vec<YearRecord>,
    ) -> Result<(), StoreError> {
        self.update(category, |doc| {
            doc.import(vocabulary, records);
            Ok(())
        })
        .await
    }
}

//! In-memory [`RecordStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use emigrant_stats_category_models::Category;
use emigrant_stats_transform_models::{Vocabulary, YearRecord};
use tokio::sync::RwLock;

use crate::document::CategoryDocument;
use crate::{RecordStore, StoreError};

/// A [`RecordStore`] that keeps every category in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<Category, CategoryDocument>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_all(&self, category: Category) -> Result<Vec<YearRecord>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&category)
            .map(CategoryDocument::all)
            .unwrap_or_default())
    }

    async fn get_by_year(
        &self,
        category: Category,
        year: i32,
    ) -> Result<Option<YearRecord>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&category).and_then(|doc| doc.get(year)))
    }

    async fn add_new(&self, category: Category, record: YearRecord) -> Result<(), StoreError> {
        let year = record.year;
        let mut documents = self.documents.write().await;
        if documents.entry(category).or_default().insert_new(record) {
            Ok(())
        } else {
            Err(StoreError::Conflict { category, year })
        }
    }

    async fn upsert(&self, category: Category, record: YearRecord) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .entry(category)
            .or_default()
            .upsert(record);
        Ok(())
    }

    async fn delete(&self, category: Category, year: i32) -> Result<bool, StoreError> {
        Ok(self
            .documents
            .write()
            .await
            .get_mut(&category)
            .is_some_and(|doc| doc.delete(year)))
    }

    async fn delete_all(&self, category: Category) -> Result<usize, StoreError> {
        Ok(self
            .documents
            .write()
            .await
            .get_mut(&category)
            .map_or(0, CategoryDocument::delete_all))
    }

    async fn vocabulary(&self, category: Category) -> Result<Option<Vocabulary>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&category)
            .and_then(|doc| doc.vocabulary.clone()))
    }

    async fn set_vocabulary(
        &self,
        category: Category,
        vocabulary: Vocabulary,
    ) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .entry(category)
            .or_default()
            .vocabulary = Some(vocabulary);
        Ok(())
    }

    async fn import(
        &self,
        category: Category,
        vocabulary: Option<Vocabulary>,
        records: Vec<YearRecord>,
    ) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .entry(category)
            .or_default()
            .import(vocabulary, records);
        Ok(())
    }
}

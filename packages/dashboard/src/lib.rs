#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard orchestration.
//!
//! Loads a category from the record store, runs it through the transform
//! pipeline its definition asks for, and returns everything one dashboard
//! page renders. Loading is explicit and returns a `Result`, so an empty
//! category and a failed load stay distinguishable.

pub mod forecast;
pub mod latest;
pub mod view;

use emigrant_stats_category_models::CategoryDefinition;
use emigrant_stats_prediction::PredictionError;
use emigrant_stats_store::{RecordStore, StoreError};
use emigrant_stats_transform::TransformError;
use emigrant_stats_transform_models::{TimeSeries, Vocabulary};

pub use forecast::{ForecastDashboard, ForecastView, prediction_dashboard};
pub use latest::LatestOnly;
pub use view::{CategoryView, load_category};

/// Errors that can occur while building a dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Reading the record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A transform rejected its input.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// The forecasting service failed as a whole.
    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

/// Loads the stored records of a category as a time series.
///
/// The vocabulary is the definition's canonical list when it has one,
/// otherwise the source order saved at upload, otherwise the sorted union of
/// the stored field names.
///
/// # Errors
///
/// * [`DashboardError::Store`] if the store cannot be read
/// * [`DashboardError::Transform`] if the store returns two records for the
///   same year
pub async fn load_series(
    store: &dyn RecordStore,
    def: &CategoryDefinition,
) -> Result<TimeSeries, DashboardError> {
    let records = store.get_all(def.id).await?;

    let vocabulary = if def.has_canonical_vocabulary() {
        Vocabulary::new(def.vocabulary.iter().cloned())
    } else if let Some(saved) = store.vocabulary(def.id).await? {
        saved
    } else {
        if !records.is_empty() {
            log::debug!("{}: no saved vocabulary, using field names", def.id);
        }
        Vocabulary::discover(&records)
    };

    log::debug!(
        "{}: loaded {} record(s), {} field(s)",
        def.id,
        records.len(),
        vocabulary.len()
    );

    TimeSeries::new(vocabulary, records)
        .map_err(|e| DashboardError::Transform(TransformError::from(e)))
}

#[cfg(test)]
mod tests {
    use emigrant_stats_category::definition;
    use emigrant_stats_category_models::Category;
    use emigrant_stats_store::MemoryStore;
    use emigrant_stats_transform_models::YearRecord;

    use super::*;

    #[tokio::test]
    async fn canonical_vocabulary_wins() {
        let store = MemoryStore::new();
        store
            .upsert(
                Category::Sex,
                YearRecord::new(1981).with_field("FEMALE", 2).with_field("MALE", 1),
            )
            .await
            .unwrap();
        let series = load_series(&store, &definition(Category::Sex)).await.unwrap();
        assert_eq!(series.vocabulary().fields(), ["MALE", "FEMALE"]);
    }

    #[tokio::test]
    async fn saved_vocabulary_keeps_source_order() {
        let store = MemoryStore::new();
        store
            .set_vocabulary(Category::Region, Vocabulary::new(["Region I", "CAR"]))
            .await
            .unwrap();
        store
            .upsert(
                Category::Region,
                YearRecord::new(1988).with_field("CAR", 1).with_field("Region I", 2),
            )
            .await
            .unwrap();
        let series = load_series(&store, &definition(Category::Region))
            .await
            .unwrap();
        assert_eq!(series.vocabulary().fields(), ["Region I", "CAR"]);
    }

    #[tokio::test]
    async fn falls_back_to_discovered_fields() {
        let store = MemoryStore::new();
        store
            .upsert(
                Category::Occupation,
                YearRecord::new(1981).with_field("Students", 1).with_field("Housewives", 2),
            )
            .await
            .unwrap();
        let series = load_series(&store, &definition(Category::Occupation))
            .await
            .unwrap();
        assert_eq!(series.vocabulary().fields(), ["Housewives", "Students"]);
    }

    #[tokio::test]
    async fn empty_category_loads_as_empty_series() {
        let store = MemoryStore::new();
        let series = load_series(&store, &definition(Category::Age)).await.unwrap();
        assert!(series.is_empty());
    }
}

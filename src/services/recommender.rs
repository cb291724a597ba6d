use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{sample_records, Dataset, RawRecord, RecommendationItem},
};

use super::{engine, ingest, model::EmbeddingRecommender, normalizer::normalize, trainer::Trainer};

/// An immutable dataset together with the model fit against it
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub dataset: Dataset,
    pub model: EmbeddingRecommender,
    pub loaded_at: DateTime<Utc>,
}

/// Result of a successful dataset load
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub total_content: usize,
    pub version: u64,
}

/// Description of the active dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub version: u64,
    pub total_content: usize,
    pub languages: Vec<String>,
    pub content_types: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Owns the active (dataset, model) pair.
///
/// Readers take a clone of the current `Arc<Snapshot>` and never observe a
/// dataset paired with a model fit elsewhere. Loads are serialized, train
/// off the async runtime, and replace the snapshot in a single assignment;
/// a failed load leaves the previous snapshot active.
pub struct Recommender {
    active: RwLock<Option<Arc<Snapshot>>>,
    load_lock: Mutex<()>,
    trainer: Trainer,
}

impl Recommender {
    /// Creates a recommender with nothing loaded
    pub fn new(trainer: Trainer) -> Self {
        Self {
            active: RwLock::new(None),
            load_lock: Mutex::new(()),
            trainer,
        }
    }

    /// Creates a recommender already serving the built-in sample catalog
    pub async fn with_sample(trainer: Trainer) -> AppResult<Self> {
        let recommender = Self::new(trainer);
        let summary = recommender.load_dataset(sample_records()).await?;
        tracing::info!(total_content = summary.total_content, "Model initialized with sample data");
        Ok(recommender)
    }

    /// Normalizes and trains on `raw_records`, then swaps the result in
    pub async fn load_dataset(&self, raw_records: Vec<RawRecord>) -> AppResult<LoadSummary> {
        self.load_with(move || Ok(raw_records)).await
    }

    /// Decodes an uploaded CSV catalog and loads it like [`Self::load_dataset`].
    /// Decoding runs on the blocking pool alongside training.
    pub async fn load_csv<B>(&self, csv: B) -> AppResult<LoadSummary>
    where
        B: AsRef<[u8]> + Send + 'static,
    {
        self.load_with(move || ingest::parse_csv(csv.as_ref())).await
    }

    async fn load_with<F>(&self, read_records: F) -> AppResult<LoadSummary>
    where
        F: FnOnce() -> AppResult<Vec<RawRecord>> + Send + 'static,
    {
        let _guard = self.load_lock.lock().await;

        let trainer = self.trainer.clone();
        let (dataset, model, row_count) = tokio::task::spawn_blocking(move || {
            let raw_records = read_records()?;
            let row_count = raw_records.len();
            let dataset = normalize(raw_records)?;
            let model = trainer.fit(&dataset)?;
            Ok::<_, AppError>((dataset, model, row_count))
        })
        .await
        .map_err(|e| AppError::Internal(format!("training task failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(error = %e, "Dataset load rejected");
            e
        })?;

        let mut active = self.active.write().await;
        let version = active.as_ref().map_or(1, |s| s.version + 1);
        let total_content = dataset.len();
        *active = Some(Arc::new(Snapshot {
            version,
            dataset,
            model,
            loaded_at: Utc::now(),
        }));

        tracing::info!(version, total_content, rows = row_count, "Dataset and model swapped in");

        Ok(LoadSummary {
            total_content,
            version,
        })
    }

    /// Current snapshot, or `NotInitialized` before the first load
    pub async fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
        self.active
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(AppError::NotInitialized)
    }

    pub async fn list_titles(&self) -> AppResult<Vec<String>> {
        Ok(self.snapshot().await?.dataset.titles())
    }

    pub async fn recommend(&self, seed_title: &str, top_k: i64) -> AppResult<Vec<RecommendationItem>> {
        let snapshot = self.snapshot().await?;
        engine::recommend(&snapshot.dataset, &snapshot.model, seed_title, top_k)
    }

    pub async fn summary(&self) -> AppResult<DatasetSummary> {
        let snapshot = self.snapshot().await?;
        Ok(DatasetSummary {
            version: snapshot.version,
            total_content: snapshot.dataset.len(),
            languages: snapshot.dataset.languages().labels().to_vec(),
            content_types: snapshot.dataset.content_types().labels().to_vec(),
            loaded_at: snapshot.loaded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer() -> Trainer {
        Trainer::new(Some(5))
    }

    #[tokio::test]
    async fn test_uninitialized_operations_fail() {
        let recommender = Recommender::new(trainer());

        assert!(matches!(recommender.list_titles().await, Err(AppError::NotInitialized)));
        assert!(matches!(
            recommender.recommend("Dark", 5).await,
            Err(AppError::NotInitialized)
        ));
        assert!(matches!(recommender.summary().await, Err(AppError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_sample_is_served_on_startup() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();

        let titles = recommender.list_titles().await.unwrap();
        assert_eq!(titles.len(), 20);
        assert_eq!(titles[0], "Wednesday");

        let items = recommender.recommend("Wednesday", 5).await.unwrap();
        assert!(items.len() <= 5);
        assert!(items.iter().all(|item| item.title != "Wednesday"));

        let summary = recommender.summary().await.unwrap();
        assert_eq!(summary.version, 1);
        assert_eq!(summary.languages, vec!["English", "German", "Korean", "Spanish"]);
    }

    #[tokio::test]
    async fn test_load_replaces_dataset_and_bumps_version() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();
        let records = vec![
            RawRecord::new("Alpha", "English", "Movie", "1,000"),
            RawRecord {
                title: None,
                ..RawRecord::new("", "English", "Movie", "5")
            },
            RawRecord::new("Beta", "French", "TV Show", "2,000"),
            RawRecord::new("Alpha", "French", "Movie", "3,000"),
            RawRecord::new("Gamma", "English", "TV Show", "4,000"),
        ];

        let summary = recommender.load_dataset(records).await.unwrap();
        assert_eq!(summary, LoadSummary { total_content: 3, version: 2 });

        let titles = recommender.list_titles().await.unwrap();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
        assert!(matches!(
            recommender.recommend("Wednesday", 5).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_snapshot() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();
        let before = recommender.snapshot().await.unwrap();

        let single = vec![RawRecord::new("Only", "English", "Movie", "10")];
        assert!(matches!(
            recommender.load_dataset(single).await,
            Err(AppError::DegenerateLabel { num_contents: 1 })
        ));

        let bad_hours = vec![
            RawRecord::new("A", "English", "Movie", "10"),
            RawRecord::new("B", "English", "Movie", "ten"),
        ];
        assert!(matches!(recommender.load_dataset(bad_hours).await, Err(AppError::Parse(_))));

        let after = recommender.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(recommender.list_titles().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_load_csv_decodes_and_swaps() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();

        let csv = "Title,Language Indicator,Content Type,Hours Viewed\n\
                   Dark,German,TV Show,\"10,000\"\n\
                   Ozark,English,TV Show,\"20,000\"\n";
        let summary = recommender.load_csv(csv.as_bytes().to_vec()).await.unwrap();
        assert_eq!(summary, LoadSummary { total_content: 2, version: 2 });
        assert_eq!(recommender.list_titles().await.unwrap(), vec!["Dark", "Ozark"]);
    }

    #[tokio::test]
    async fn test_load_csv_with_missing_column_keeps_previous_snapshot() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();
        let before = recommender.snapshot().await.unwrap();

        let csv = "Title,Content Type,Hours Viewed\nDark,TV Show,10\n";
        match recommender.load_csv(csv).await {
            Err(AppError::DataFormat(msg)) => assert!(msg.contains("Language Indicator")),
            other => panic!("expected data format error, got {:?}", other),
        }

        let after = recommender.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_held_snapshot_survives_swap() {
        let recommender = Recommender::with_sample(trainer()).await.unwrap();
        let old = recommender.snapshot().await.unwrap();

        recommender
            .load_dataset(vec![
                RawRecord::new("A", "English", "Movie", "10"),
                RawRecord::new("B", "English", "Movie", "20"),
            ])
            .await
            .unwrap();

        // a reader holding the old snapshot still sees a consistent pair
        assert_eq!(old.dataset.len(), old.model.num_contents());
        let items = engine::recommend(&old.dataset, &old.model, "Wednesday", 3).unwrap();
        assert_eq!(items.len(), 3);

        let new = recommender.snapshot().await.unwrap();
        assert_eq!(new.version, 2);
        assert_eq!(new.dataset.len(), new.model.num_contents());
    }
}

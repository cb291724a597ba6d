pub mod engine;
pub mod ingest;
pub mod model;
pub mod normalizer;
pub mod optimizer;
pub mod recommender;
pub mod trainer;

pub use model::{EmbeddingRecommender, ModelShape};
pub use recommender::{DatasetSummary, LoadSummary, Recommender, Snapshot};
pub use trainer::Trainer;

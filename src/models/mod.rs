pub mod dataset;
pub mod record;
pub mod sample;

pub use dataset::{CategoricalEncoding, Dataset};
pub use record::{ContentRecord, Features, RawRecord, RecommendationItem, REQUIRED_COLUMNS};
pub use sample::sample_records;

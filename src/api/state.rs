use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    services::{Recommender, Trainer},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wraps an existing recommender
    pub fn new(recommender: Recommender, config: Config) -> Self {
        Self {
            recommender: Arc::new(recommender),
            config: Arc::new(config),
        }
    }

    /// Creates state serving the built-in sample catalog
    pub async fn bootstrap(config: Config) -> AppResult<Self> {
        let trainer = Trainer::new(config.training_seed);
        let recommender = Recommender::with_sample(trainer).await?;
        Ok(Self::new(recommender, config))
    }
}

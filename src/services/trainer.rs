use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, Features},
};

use super::{
    model::{EmbeddingRecommender, ModelShape},
    optimizer::Adam,
};

/// Passes over the full dataset per fit
pub const EPOCHS: usize = 5;
pub const BATCH_SIZE: usize = 64;
pub const LEARNING_RATE: f32 = 0.001;

/// Fits an embedding recommender to a dataset.
///
/// Each record is trained to predict its own content id from its
/// (content, language, type) triple. The schedule is fixed: no validation
/// split and no early stopping.
#[derive(Debug, Clone)]
pub struct Trainer {
    epochs: usize,
    batch_size: usize,
    learning_rate: f32,
    seed: Option<u64>,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Trainer {
    /// Creates a trainer; without a seed every fit draws fresh randomness
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            epochs: EPOCHS,
            batch_size: BATCH_SIZE,
            learning_rate: LEARNING_RATE,
            seed,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn fit(&self, dataset: &Dataset) -> AppResult<EmbeddingRecommender> {
        self.fit_with_history(dataset).map(|(model, _)| model)
    }

    /// Fits a fresh model and returns it with the mean loss of every epoch
    pub fn fit_with_history(&self, dataset: &Dataset) -> AppResult<(EmbeddingRecommender, Vec<f32>)> {
        if dataset.is_empty() {
            return Err(AppError::EmptyDataset);
        }
        if dataset.len() < 2 {
            return Err(AppError::DegenerateLabel {
                num_contents: dataset.len(),
            });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let shape = ModelShape::of(dataset);
        let mut model = EmbeddingRecommender::new(shape, &mut rng);
        let mut adam = Adam::new(self.learning_rate);

        let samples = dataset.training_samples();
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut history = Vec::with_capacity(self.epochs);

        tracing::info!(
            num_contents = shape.num_contents,
            num_languages = shape.num_languages,
            num_types = shape.num_types,
            epochs = self.epochs,
            batch_size = self.batch_size,
            "Training recommender model"
        );

        for epoch in 0..self.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0f32;

            for chunk in order.chunks(self.batch_size.max(1)) {
                let batch: Vec<Features> = chunk.iter().map(|&i| samples[i].0).collect();
                let targets: Vec<usize> = chunk.iter().map(|&i| samples[i].1).collect();

                let (loss, grads) = model.loss_and_gradients(&batch, &targets);
                adam.step(&mut model.params, &grads);
                total_loss += loss * chunk.len() as f32;
            }

            let epoch_loss = total_loss / samples.len() as f32;
            tracing::debug!(epoch = epoch + 1, loss = epoch_loss, "Epoch completed");
            history.push(epoch_loss);
        }

        tracing::info!(
            steps = adam.steps(),
            final_loss = history.last().copied().unwrap_or_default(),
            "Model training completed"
        );

        Ok((model, history))
    }
}

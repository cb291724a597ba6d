//! Embedding recommender network.
//!
//! Three embedding tables (content, language, content type) are concatenated
//! into a 44-wide vector and passed through two ReLU layers and a softmax
//! output with one unit per content id:
//!
//! ```text
//! [content(32) | language(8) | type(4)] -> Dense(64, relu) -> Dense(32, relu) -> Dense(N, softmax)
//! ```
//!
//! Every table has one extra trailing row that absorbs ids outside the known
//! range, so lookups never go out of bounds.

use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD, Axis};
use rand::{distributions::Uniform, Rng};

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, Features},
};

pub const CONTENT_EMBEDDING_DIM: usize = 32;
pub const LANGUAGE_EMBEDDING_DIM: usize = 8;
pub const TYPE_EMBEDDING_DIM: usize = 4;
pub const INPUT_DIM: usize = CONTENT_EMBEDDING_DIM + LANGUAGE_EMBEDDING_DIM + TYPE_EMBEDDING_DIM;
pub const HIDDEN1_UNITS: usize = 64;
pub const HIDDEN2_UNITS: usize = 32;

const EMBEDDING_INIT_RANGE: f32 = 0.05;
const PROBABILITY_FLOOR: f32 = 1e-7;

const LANGUAGE_OFFSET: usize = CONTENT_EMBEDDING_DIM;
const TYPE_OFFSET: usize = CONTENT_EMBEDDING_DIM + LANGUAGE_EMBEDDING_DIM;

/// Vocabulary sizes the network is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    pub num_contents: usize,
    pub num_languages: usize,
    pub num_types: usize,
}

impl ModelShape {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            num_contents: dataset.len(),
            num_languages: dataset.languages().len(),
            num_types: dataset.content_types().len(),
        }
    }
}

/// Fully connected layer: y = xW + b
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dense {
    /// Shape: [in_features, out_features]
    pub(crate) weight: Array2<f32>,
    pub(crate) bias: Array1<f32>,
}

impl Dense {
    /// Glorot-uniform weights, zero bias
    fn glorot<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (in_features + out_features) as f32).sqrt();
        Self {
            weight: uniform((in_features, out_features), limit, rng),
            bias: Array1::zeros(out_features),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            weight: Array2::zeros(self.weight.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        input.dot(&self.weight) + &self.bias
    }
}

/// Every trainable tensor of the network.
///
/// Gradients use the same layout, so an optimizer can walk parameters and
/// gradients in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameters {
    pub(crate) content_embedding: Array2<f32>,
    pub(crate) language_embedding: Array2<f32>,
    pub(crate) type_embedding: Array2<f32>,
    pub(crate) hidden1: Dense,
    pub(crate) hidden2: Dense,
    pub(crate) output: Dense,
}

impl Parameters {
    fn init<R: Rng>(shape: ModelShape, rng: &mut R) -> Self {
        Self {
            content_embedding: uniform(
                (shape.num_contents + 1, CONTENT_EMBEDDING_DIM),
                EMBEDDING_INIT_RANGE,
                rng,
            ),
            language_embedding: uniform(
                (shape.num_languages + 1, LANGUAGE_EMBEDDING_DIM),
                EMBEDDING_INIT_RANGE,
                rng,
            ),
            type_embedding: uniform(
                (shape.num_types + 1, TYPE_EMBEDDING_DIM),
                EMBEDDING_INIT_RANGE,
                rng,
            ),
            hidden1: Dense::glorot(INPUT_DIM, HIDDEN1_UNITS, rng),
            hidden2: Dense::glorot(HIDDEN1_UNITS, HIDDEN2_UNITS, rng),
            output: Dense::glorot(HIDDEN2_UNITS, shape.num_contents, rng),
        }
    }

    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            content_embedding: Array2::zeros(self.content_embedding.raw_dim()),
            language_embedding: Array2::zeros(self.language_embedding.raw_dim()),
            type_embedding: Array2::zeros(self.type_embedding.raw_dim()),
            hidden1: self.hidden1.zeros_like(),
            hidden2: self.hidden2.zeros_like(),
            output: self.output.zeros_like(),
        }
    }

    /// Visits each (parameter, gradient) pair with a stable slot index
    pub(crate) fn zip_mut_with<F>(&mut self, grads: &Parameters, mut f: F)
    where
        F: FnMut(usize, ArrayViewMutD<'_, f32>, ArrayViewD<'_, f32>),
    {
        f(0, self.content_embedding.view_mut().into_dyn(), grads.content_embedding.view().into_dyn());
        f(1, self.language_embedding.view_mut().into_dyn(), grads.language_embedding.view().into_dyn());
        f(2, self.type_embedding.view_mut().into_dyn(), grads.type_embedding.view().into_dyn());
        f(3, self.hidden1.weight.view_mut().into_dyn(), grads.hidden1.weight.view().into_dyn());
        f(4, self.hidden1.bias.view_mut().into_dyn(), grads.hidden1.bias.view().into_dyn());
        f(5, self.hidden2.weight.view_mut().into_dyn(), grads.hidden2.weight.view().into_dyn());
        f(6, self.hidden2.bias.view_mut().into_dyn(), grads.hidden2.bias.view().into_dyn());
        f(7, self.output.weight.view_mut().into_dyn(), grads.output.weight.view().into_dyn());
        f(8, self.output.bias.view_mut().into_dyn(), grads.output.bias.view().into_dyn());
    }
}

/// Intermediate values of one forward pass, kept for back-propagation
struct Activations {
    input: Array2<f32>,
    hidden1: Array2<f32>,
    hidden2: Array2<f32>,
    probabilities: Array2<f32>,
}

/// Fitted embedding network mapping a feature triple to a distribution over
/// content ids
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecommender {
    shape: ModelShape,
    pub(crate) params: Parameters,
}

impl EmbeddingRecommender {
    /// Creates an untrained network with freshly initialized weights
    pub fn new<R: Rng>(shape: ModelShape, rng: &mut R) -> Self {
        Self {
            shape,
            params: Parameters::init(shape, rng),
        }
    }

    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    /// Width of the output distribution
    pub fn num_contents(&self) -> usize {
        self.shape.num_contents
    }

    /// Scores every content id for one feature triple.
    ///
    /// `expected_contents` is the size of the dataset the caller is ranking
    /// against; it must match the width this model was fit with.
    pub fn predict(&self, features: Features, expected_contents: usize) -> AppResult<Array1<f32>> {
        if expected_contents != self.shape.num_contents {
            return Err(AppError::ShapeMismatch {
                expected: expected_contents,
                actual: self.shape.num_contents,
            });
        }

        let activations = self.forward(&[features]);
        Ok(activations.probabilities.row(0).to_owned())
    }

    /// Mean sparse categorical cross-entropy over the batch and the gradient
    /// of that loss with respect to every parameter
    pub(crate) fn loss_and_gradients(
        &self,
        batch: &[Features],
        targets: &[usize],
    ) -> (f32, Parameters) {
        let batch_size = batch.len().max(1) as f32;
        let acts = self.forward(batch);

        let loss = targets
            .iter()
            .enumerate()
            .map(|(i, &t)| -acts.probabilities[[i, t]].max(PROBABILITY_FLOOR).ln())
            .sum::<f32>()
            / batch_size;

        let mut grads = self.params.zeros_like();

        // softmax + cross-entropy: dL/dz = p - onehot(target)
        let mut d_logits = acts.probabilities.clone();
        for (i, &t) in targets.iter().enumerate() {
            d_logits[[i, t]] -= 1.0;
        }
        d_logits /= batch_size;

        grads.output.weight = acts.hidden2.t().dot(&d_logits);
        grads.output.bias = d_logits.sum_axis(Axis(0));

        let mut d_hidden2 = d_logits.dot(&self.params.output.weight.t());
        relu_backward(&mut d_hidden2, &acts.hidden2);
        grads.hidden2.weight = acts.hidden1.t().dot(&d_hidden2);
        grads.hidden2.bias = d_hidden2.sum_axis(Axis(0));

        let mut d_hidden1 = d_hidden2.dot(&self.params.hidden2.weight.t());
        relu_backward(&mut d_hidden1, &acts.hidden1);
        grads.hidden1.weight = acts.input.t().dot(&d_hidden1);
        grads.hidden1.bias = d_hidden1.sum_axis(Axis(0));

        let d_input = d_hidden1.dot(&self.params.hidden1.weight.t());
        for (i, features) in batch.iter().enumerate() {
            let rows = self.rows(features);
            let mut content = grads.content_embedding.row_mut(rows.content);
            content += &d_input.slice(s![i, ..LANGUAGE_OFFSET]);
            let mut language = grads.language_embedding.row_mut(rows.language);
            language += &d_input.slice(s![i, LANGUAGE_OFFSET..TYPE_OFFSET]);
            let mut content_type = grads.type_embedding.row_mut(rows.content_type);
            content_type += &d_input.slice(s![i, TYPE_OFFSET..]);
        }

        (loss, grads)
    }

    fn forward(&self, batch: &[Features]) -> Activations {
        let mut input = Array2::zeros((batch.len(), INPUT_DIM));
        for (i, features) in batch.iter().enumerate() {
            let rows = self.rows(features);
            input
                .slice_mut(s![i, ..LANGUAGE_OFFSET])
                .assign(&self.params.content_embedding.row(rows.content));
            input
                .slice_mut(s![i, LANGUAGE_OFFSET..TYPE_OFFSET])
                .assign(&self.params.language_embedding.row(rows.language));
            input
                .slice_mut(s![i, TYPE_OFFSET..])
                .assign(&self.params.type_embedding.row(rows.content_type));
        }

        let hidden1 = self.params.hidden1.forward(&input).mapv_into(relu);
        let hidden2 = self.params.hidden2.forward(&hidden1).mapv_into(relu);
        let mut probabilities = self.params.output.forward(&hidden2);
        softmax_rows(&mut probabilities);

        Activations {
            input,
            hidden1,
            hidden2,
            probabilities,
        }
    }

    /// Embedding rows for a triple, routing unknown ids to the reserved row
    fn rows(&self, features: &Features) -> EmbeddingRows {
        EmbeddingRows {
            content: features.content_id.min(self.shape.num_contents),
            language: features.language_id.min(self.shape.num_languages),
            content_type: features.type_id.min(self.shape.num_types),
        }
    }
}

struct EmbeddingRows {
    content: usize,
    language: usize,
    content_type: usize,
}

fn uniform<R: Rng>(shape: (usize, usize), limit: f32, rng: &mut R) -> Array2<f32> {
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_fn(shape, |_| rng.sample(&dist))
}

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Zeroes gradient entries whose activation was clamped by ReLU
fn relu_backward(grad: &mut Array2<f32>, activation: &Array2<f32>) {
    grad.zip_mut_with(activation, |g, &a| {
        if a <= 0.0 {
            *g = 0.0;
        }
    });
}

fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
}

use ndarray::{ArrayD, Zip};

use super::model::Parameters;

/// Adam optimizer (Kingma & Ba, 2015).
///
/// Update rule, with the bias correction folded into the step size:
/// ```text
/// m_t = β₁ * m_{t-1} + (1 - β₁) * grad
/// v_t = β₂ * v_{t-1} + (1 - β₂) * grad²
/// lr_t = lr * √(1 - β₂ᵗ) / (1 - β₁ᵗ)
/// param = param - lr_t * m_t / (√v_t + ε)
/// ```
#[derive(Debug)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    /// First and second moment estimates, one pair per parameter slot
    moments: Vec<(ArrayD<f32>, ArrayD<f32>)>,
    t: i32,
}

impl Adam {
    /// Default: β₁=0.9, β₂=0.999, ε=1e-7
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            moments: Vec::new(),
            t: 0,
        }
    }

    /// Number of updates applied so far
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Applies one update to every parameter from its gradient
    pub(crate) fn step(&mut self, params: &mut Parameters, grads: &Parameters) {
        self.t += 1;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.eps);
        let lr_t = self.lr * (1.0 - beta2.powi(self.t)).sqrt() / (1.0 - beta1.powi(self.t));
        let moments = &mut self.moments;

        params.zip_mut_with(grads, |slot, mut param, grad| {
            if moments.len() <= slot {
                moments.push((ArrayD::zeros(param.raw_dim()), ArrayD::zeros(param.raw_dim())));
            }
            let (m, v) = &mut moments[slot];

            Zip::from(&mut param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + eps);
                });
        });
    }
}

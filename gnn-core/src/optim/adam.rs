use crate::device::AdamStep;
use crate::error::GnnError;
use crate::nn::ParamSet;
use crate::optim::grad_clipping::GradClipping;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{check_learning_rate, Optimizer};

/// Hyperparameters of [`Adam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    /// L2 penalty folded into the gradient before the moment updates.
    pub weight_decay: f32,
    pub clipping: GradClipping,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            clipping: GradClipping::default(),
        }
    }
}

impl AdamConfig {
    /// Default hyperparameters with the given learning rate.
    pub fn with_learning_rate(learning_rate: f32) -> Self {
        AdamConfig {
            learning_rate,
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns `GnnError::ConfigurationError` for a non-positive learning rate
    /// or epsilon, betas outside `[0, 1)`, a negative weight decay or invalid
    /// clipping.
    pub fn validate(&self) -> Result<(), GnnError> {
        check_learning_rate(self.learning_rate)?;
        if !(0.0..1.0).contains(&self.beta1) {
            return Err(GnnError::ConfigurationError(
                "Beta1 must be in [0, 1)".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.beta2) {
            return Err(GnnError::ConfigurationError(
                "Beta2 must be in [0, 1)".to_string(),
            ));
        }
        if !(self.eps > 0.0) {
            return Err(GnnError::ConfigurationError(
                "Epsilon must be positive".to_string(),
            ));
        }
        if !(self.weight_decay >= 0.0) {
            return Err(GnnError::ConfigurationError(
                "Weight decay must be non-negative".to_string(),
            ));
        }
        self.clipping.validate()
    }
}

/// Adam optimizer with bias-corrected moment estimates.
///
/// The step counter `t` advances once per [`Optimizer::update`], shared by
/// all parameters. Per element, with `g = grad + weight_decay * value`:
///
/// ```text
/// m = beta1 * m + (1 - beta1) * g
/// v = beta2 * v + (1 - beta2) * g^2
/// value -= lr * (m / (1 - beta1^t)) / (sqrt(v / (1 - beta2^t)) + eps)
/// ```
#[derive(Debug)]
pub struct Adam {
    config: AdamConfig,
    iterations: u64,
    state: OptimizerState,
}

impl Adam {
    /// # Errors
    /// See [`AdamConfig::validate`].
    pub fn new(config: AdamConfig) -> Result<Self, GnnError> {
        config.validate()?;
        Ok(Adam {
            config,
            iterations: 0,
            state: OptimizerState::new(),
        })
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    /// Number of updates performed so far.
    pub fn step_count(&self) -> u64 {
        self.iterations
    }

    /// `lr * sqrt(1 - beta2^t) / (1 - beta1^t)` at the current step count;
    /// the base learning rate before the first update.
    pub fn effective_learning_rate(&self) -> f32 {
        if self.iterations == 0 {
            return self.config.learning_rate;
        }
        let (bc1, bc2) = self.bias_corrections(self.iterations);
        self.config.learning_rate * bc2.sqrt() / bc1
    }

    /// First and second moment buffers, one pair per updated parameter.
    pub fn state(&self) -> &OptimizerState {
        &self.state
    }

    fn bias_corrections(&self, t: u64) -> (f32, f32) {
        let t = t.min(i32::MAX as u64) as i32;
        (
            1.0 - self.config.beta1.powi(t),
            1.0 - self.config.beta2.powi(t),
        )
    }
}

impl Optimizer for Adam {
    fn update(&mut self, params: &mut ParamSet) -> Result<(), GnnError> {
        self.config.clipping.apply(params)?;
        self.iterations += 1;
        let (bias_correction1, bias_correction2) = self.bias_corrections(self.iterations);
        let step = AdamStep {
            lr: self.config.learning_rate,
            beta1: self.config.beta1,
            beta2: self.config.beta2,
            eps: self.config.eps,
            bias_correction1,
            bias_correction2,
            weight_decay: self.config.weight_decay,
        };

        let device = params.device();
        for param in params.iter_mut() {
            let slots = self.state.slots_for(param.name(), 2, param.shape(), device);
            let [m, v] = slots else {
                return Err(GnnError::InternalError(format!(
                    "Adam state for '{}' must hold two moment buffers",
                    param.name()
                )));
            };
            let (value, grad) = param.value_and_grad_mut();
            device.backend().adam_step(
                step,
                value.storage_mut(),
                grad.storage(),
                m.storage_mut(),
                v.storage_mut(),
            );
        }
        params.zero_gradients();
        log::trace!(
            "Adam: step {} (effective lr {})",
            self.iterations,
            self.effective_learning_rate()
        );
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.config.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) -> Result<(), GnnError> {
        check_learning_rate(lr)?;
        self.config.learning_rate = lr;
        Ok(())
    }
}

#[cfg(test)]
#[path = "adam_test.rs"]
mod tests;

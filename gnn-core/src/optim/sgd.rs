use crate::device::SgdStep;
use crate::error::GnnError;
use crate::nn::ParamSet;
use crate::optim::grad_clipping::GradClipping;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{check_learning_rate, Optimizer};

/// Hyperparameters of [`MomentumSgd`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgdConfig {
    pub learning_rate: f32,
    pub momentum: f32,
    pub weight_decay: f32,
    pub clipping: GradClipping,
}

impl Default for SgdConfig {
    fn default() -> Self {
        SgdConfig {
            learning_rate: 0.01,
            momentum: 0.9,
            weight_decay: 0.0,
            clipping: GradClipping::default(),
        }
    }
}

impl SgdConfig {
    /// # Errors
    /// Returns `GnnError::ConfigurationError` for a non-positive learning rate,
    /// a momentum outside `[0, 1)`, a negative weight decay or invalid clipping.
    pub fn validate(&self) -> Result<(), GnnError> {
        check_learning_rate(self.learning_rate)?;
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(GnnError::ConfigurationError(
                "Momentum must be in [0, 1)".to_string(),
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

/// Stochastic gradient descent with momentum.
///
/// Per element: `v = momentum * v + grad + weight_decay * value`, then
/// `value -= lr * v`. Velocities start at zero.
#[derive(Debug)]
pub struct MomentumSgd {
    config: SgdConfig,
    state: OptimizerState,
}

impl MomentumSgd {
    /// # Errors
    /// See [`SgdConfig::validate`].
    pub fn new(config: SgdConfig) -> Result<Self, GnnError> {
        config.validate()?;
        Ok(MomentumSgd {
            config,
            state: OptimizerState::new(),
        })
    }

    pub fn config(&self) -> &SgdConfig {
        &self.config
    }

    /// Velocity buffers, one per updated parameter.
    pub fn state(&self) -> &OptimizerState {
        &self.state
    }
}

impl Optimizer for MomentumSgd {
    fn update(&mut self, params: &mut ParamSet) -> Result<(), GnnError> {
        self.config.clipping.apply(params)?;
        let step = SgdStep {
            lr: self.config.learning_rate,
            momentum: self.config.momentum,
            weight_decay: self.config.weight_decay,
        };
        let device = params.device();
        for param in params.iter_mut() {
            let slots = self.state.slots_for(param.name(), 1, param.shape(), device);
            let (value, grad) = param.value_and_grad_mut();
            device
                .backend()
                .momentum_sgd_step(step, value.storage_mut(), grad.storage(), slots[0].storage_mut());
        }
        params.zero_gradients();
        log::trace!("MomentumSgd: updated {} parameters", params.len());
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
#[path = "sgd_test.rs"]
mod tests;

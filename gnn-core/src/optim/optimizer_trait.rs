use crate::error::GnnError;
use crate::nn::ParamSet;

/// Trait defining the common interface for all optimizers.
///
/// Optimizers are responsible for updating the values of a [`ParamSet`] from
/// the gradients accumulated by `back_propagate`.
pub trait Optimizer {
    /// Performs a single optimization step.
    ///
    /// Applies gradient clipping when configured, updates every parameter of
    /// `params` from its accumulated gradient, then zeroes all gradients.
    ///
    /// # Errors
    /// Returns `GnnError::ConfigurationError` when clipping is configured with
    /// an invalid threshold, or `GnnError::InternalError` if the optimizer's
    /// state no longer fits a parameter.
    fn update(&mut self, params: &mut ParamSet) -> Result<(), GnnError>;

    /// The base learning rate.
    fn learning_rate(&self) -> f32;

    /// Replaces the base learning rate.
    ///
    /// # Errors
    /// Returns `GnnError::ConfigurationError` unless `lr` is positive and finite.
    fn set_learning_rate(&mut self, lr: f32) -> Result<(), GnnError>;
}

pub(crate) fn check_learning_rate(lr: f32) -> Result<(), GnnError> {
    if !(lr > 0.0 && lr.is_finite()) {
        return Err(GnnError::ConfigurationError(format!(
            "Learning rate must be positive, got {}",
            lr
        )));
    }
    Ok(())
}

use crate::error::GnnError;
use crate::nn::ParamSet;

/// Global-norm gradient clipping applied by optimizers before their update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradClipping {
    pub enabled: bool,
    /// Largest allowed L2 norm of all gradients taken together.
    pub max_norm: f32,
}

impl Default for GradClipping {
    fn default() -> Self {
        GradClipping {
            enabled: false,
            max_norm: 5.0,
        }
    }
}

impl GradClipping {
    /// Enabled clipping at `max_norm`.
    pub fn with_max_norm(max_norm: f32) -> Self {
        GradClipping {
            enabled: true,
            max_norm,
        }
    }

    /// # Errors
    /// Returns `GnnError::ConfigurationError` if enabled with a threshold that
    /// is not positive and finite.
    pub fn validate(&self) -> Result<(), GnnError> {
        if self.enabled {
            check_max_norm(self.max_norm)?;
        }
        Ok(())
    }

    /// Clips `params` when enabled and returns the norm measured before clipping.
    pub fn apply(&self, params: &mut ParamSet) -> Result<Option<f32>, GnnError> {
        if !self.enabled {
            return Ok(None);
        }
        clip_grad_norm(params, self.max_norm).map(Some)
    }
}

/// L2 norm of all gradients of `params` viewed as one vector.
pub fn global_grad_norm(params: &ParamSet) -> f32 {
    params
        .iter()
        .map(|p| p.grad().device().backend().squared_norm(p.grad().storage()))
        .sum::<f64>()
        .sqrt() as f32
}

/// Clips the overall norm of the gradients of `params` in place.
///
/// If the global L2 norm exceeds `max_norm`, every gradient is scaled by
/// `max_norm / norm`. Returns the norm measured before clipping.
///
/// # Errors
/// Returns `GnnError::ConfigurationError` if `max_norm` is not positive and finite.
pub fn clip_grad_norm(params: &mut ParamSet, max_norm: f32) -> Result<f32, GnnError> {
    check_max_norm(max_norm)?;
    let norm = global_grad_norm(params);
    if norm > max_norm {
        let factor = max_norm / norm;
        log::debug!("clip_grad_norm: norm {} > {}, scaling by {}", norm, max_norm, factor);
        for param in params.iter_mut() {
            let grad = param.grad_mut();
            grad.device().backend().scale(factor, grad.storage_mut());
        }
    }
    Ok(norm)
}

fn check_max_norm(max_norm: f32) -> Result<(), GnnError> {
    if !(max_norm > 0.0 && max_norm.is_finite()) {
        return Err(GnnError::ConfigurationError(format!(
            "max_norm must be positive, got {}",
            max_norm
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "grad_clipping_test.rs"]
mod tests;

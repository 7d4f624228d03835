use crate::device::StorageDevice;
use crate::tensor::DenseTensor;

/// A trainable tensor together with its gradient accumulator.
///
/// Both tensors always share the parameter's shape and device. The
/// accumulator starts at zero, only grows through
/// [`ParamSet::accumulate_gradient`](crate::nn::ParamSet::accumulate_gradient)
/// and is reset by the optimizer after each update.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    value: DenseTensor<f32>,
    grad: DenseTensor<f32>,
}

impl Parameter {
    pub(crate) fn zeros(name: &str, shape: &[usize], device: StorageDevice) -> Self {
        Parameter {
            name: name.to_string(),
            value: DenseTensor::zeros(shape, device),
            grad: DenseTensor::zeros(shape, device),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub fn value(&self) -> &DenseTensor<f32> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut DenseTensor<f32> {
        &mut self.value
    }

    pub fn grad(&self) -> &DenseTensor<f32> {
        &self.grad
    }

    pub(crate) fn grad_mut(&mut self) -> &mut DenseTensor<f32> {
        &mut self.grad
    }

    /// Split borrow used by optimizers: `(value, gradient)`.
    pub(crate) fn value_and_grad_mut(&mut self) -> (&mut DenseTensor<f32>, &mut DenseTensor<f32>) {
        (&mut self.value, &mut self.grad)
    }
}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;

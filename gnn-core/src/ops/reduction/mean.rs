use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, GradSink, Operator};
use crate::ops::value::{NodeValue, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;
use crate::types::ValueKind;

/// Mean of all elements, producing a one-element tensor of shape `[1]`.
///
/// Backward distributes `g / N` to each of the `N` input elements. The mean of
/// an empty input is NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceMean;

impl Operator for ReduceMean {
    fn name(&self) -> &str {
        "ReduceMean"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 1, self.name())?;
        inputs[0].expect_kind(ValueKind::Dense, self.name())?;
        Ok(TensorSpec::dense(vec![Some(1)]))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 1, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let x = inputs[0].as_dense(self.name())?;
        let backend = device.backend();
        let mean = backend.sum(x.storage()) / x.numel() as f64;
        let y = output.dense_mut(self.name())?.prepare_output(&[1]);
        backend.fill(mean as f32, y);
        Ok(())
    }

    fn backward(
        &self,
        inputs: &[ValueRef<'_>],
        _output: &NodeValue,
        grad_output: &DenseTensor<f32>,
        grads: &mut GradSink<'_>,
    ) -> Result<(), GnnError> {
        let x = inputs[0].as_dense(self.name())?;
        let g = grad_output.as_scalar()?;
        if let Some(grad_x) = grads.grad_mut(0) {
            let share = g / x.numel() as f32;
            grad_output
                .device()
                .backend()
                .add_scalar(share, grad_x.storage_mut());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mean_test.rs"]
mod tests;

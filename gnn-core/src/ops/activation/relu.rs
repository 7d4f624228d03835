use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, GradSink, Operator};
use crate::ops::value::{NodeValue, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;
use crate::types::ValueKind;

/// Rectified linear unit, `y = max(0, x)` element-wise.
///
/// The gradient passes through where the input is strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReLU;

impl Operator for ReLU {
    fn name(&self) -> &str {
        "ReLU"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 1, self.name())?;
        inputs[0].expect_kind(ValueKind::Dense, self.name())?;
        Ok(inputs[0].clone())
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 1, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let x = inputs[0].as_dense(self.name())?;
        let y = output.dense_mut(self.name())?.prepare_output(x.shape());
        device.backend().relu_forward(x.storage(), y);
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
        if grad_output.shape() != x.shape() {
            return Err(GnnError::shape(x.shape(), grad_output.shape(), "ReLU backward"));
        }
        if let Some(grad_x) = grads.grad_mut(0) {
            grad_output
                .device()
                .backend()
                .relu_backward(x.storage(), grad_output.storage(), grad_x.storage_mut());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "relu_test.rs"]
mod tests;

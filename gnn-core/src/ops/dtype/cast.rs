use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, GradSink, Operator};
use crate::ops::value::{NodeValue, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;
use crate::types::ValueKind;

/// Converts an integer (or dense) tensor into a dense `f32` tensor of the same
/// shape.
///
/// Dense inputs are copied and receive the output gradient unchanged; integer
/// inputs never carry a gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCast;

impl Operator for TypeCast {
    fn name(&self) -> &str {
        "TypeCast"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 1, self.name())?;
        if inputs[0].kind == ValueKind::Sparse {
            return Err(GnnError::DataTypeMismatch {
                expected: ValueKind::Int,
                actual: ValueKind::Sparse,
                operation: self.name().to_string(),
            });
        }
        Ok(TensorSpec::new(ValueKind::Dense, inputs[0].shape.clone()))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 1, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let y = output.dense_mut(self.name())?;
        match inputs[0] {
            ValueRef::Int(x) => {
                let out = y.prepare_output(x.shape());
                device.backend().cast_i32_to_f32(x.storage(), out);
                Ok(())
            }
            ValueRef::Dense(x) => y.copy_from(x),
            other => Err(GnnError::DataTypeMismatch {
                expected: ValueKind::Int,
                actual: other.kind(),
                operation: self.name().to_string(),
            }),
        }
    }

    fn backward(
        &self,
        inputs: &[ValueRef<'_>],
        _output: &NodeValue,
        grad_output: &DenseTensor<f32>,
        grads: &mut GradSink<'_>,
    ) -> Result<(), GnnError> {
        if inputs[0].kind() != ValueKind::Dense {
            return Ok(());
        }
        if let Some(grad_x) = grads.grad_mut(0) {
            grad_output
                .device()
                .backend()
                .axpy(1.0, grad_output.storage(), grad_x.storage_mut());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cast_test.rs"]
mod tests;

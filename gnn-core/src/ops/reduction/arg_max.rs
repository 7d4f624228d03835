use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, Operator};
use crate::ops::value::{NodeValue, TensorSpec, ValueRef};
use crate::types::ValueKind;

/// Per-row column index of the largest stored value of a sparse matrix.
///
/// Input `[rows, cols]` (sparse) -> output `[rows]` (`i32`). Rows without any
/// stored entry yield `-1`; on ties the first stored entry wins. Used to turn
/// one-hot labels back into class indices. Not differentiable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMax;

impl Operator for ArgMax {
    fn name(&self) -> &str {
        "ArgMax"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 1, self.name())?;
        inputs[0].expect_kind(ValueKind::Sparse, self.name())?;
        let dims = inputs[0].shape.dims_of_rank(2, self.name())?;
        Ok(TensorSpec::int(vec![dims[0]]))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 1, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let matrix = inputs[0].as_sparse(self.name())?;
        let out = output.int_mut(self.name())?.prepare_output(&[matrix.rows()]);
        device.backend().csr_arg_max(matrix.csr(), out);
        Ok(())
    }

    fn is_differentiable(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "arg_max_test.rs"]
mod tests;

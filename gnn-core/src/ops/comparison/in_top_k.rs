use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, Operator};
use crate::ops::value::{unify_dim, NodeValue, TensorSpec, ValueRef};
use crate::types::ValueKind;

/// Whether each row's label is among the row's `k` highest scores.
///
/// Inputs: scores `[rows, cols]` (dense) and labels `[rows]` (`i32`).
/// Output: `[rows]` (`i32`), 1 on a hit and 0 otherwise. A label counts as a
/// hit when fewer than `k` scores in its row are strictly greater than its own
/// score, so ties resolve in the label's favour. Labels outside `[0, cols)` or
/// with a non-finite score are misses. Not differentiable.
#[derive(Debug, Clone, Copy)]
pub struct InTopK {
    k: usize,
}

impl InTopK {
    pub fn new(k: usize) -> Self {
        InTopK { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl Default for InTopK {
    fn default() -> Self {
        InTopK::new(1)
    }
}

impl Operator for InTopK {
    fn name(&self) -> &str {
        "InTopK"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 2, self.name())?;
        inputs[0].expect_kind(ValueKind::Dense, "InTopK scores")?;
        inputs[1].expect_kind(ValueKind::Int, "InTopK labels")?;
        let scores = inputs[0].shape.dims_of_rank(2, "InTopK scores")?;
        let labels = inputs[1].shape.dims_of_rank(1, "InTopK labels")?;
        let rows = unify_dim(scores[0], labels[0]).map_err(|_| {
            GnnError::shape(&inputs[0].shape.display_dims(), &inputs[1].shape.display_dims(), "InTopK")
        })?;
        Ok(TensorSpec::int(vec![rows]))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 2, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let scores = inputs[0].as_dense(self.name())?;
        let labels = inputs[1].as_int(self.name())?;
        if scores.rank() != 2 || labels.shape() != [scores.rows()].as_slice() {
            return Err(GnnError::shape(scores.shape(), labels.shape(), "InTopK"));
        }
        let out = output.int_mut(self.name())?.prepare_output(&[scores.rows()]);
        device
            .backend()
            .in_top_k(scores.storage(), scores.cols(), labels.storage(), self.k, out);
        Ok(())
    }

    fn is_differentiable(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "in_top_k_test.rs"]
mod tests;

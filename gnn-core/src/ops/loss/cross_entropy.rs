use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, GradSink, Operator};
use crate::ops::value::{unify_dim, NodeValue, TensorSpec, ValueRef};
use crate::tensor::{DenseTensor, SparseTensor};
use crate::types::ValueKind;

/// Per-row cross-entropy between dense scores `[rows, cols]` and sparse labels
/// `[rows, cols]`, producing a loss vector `[rows]`.
///
/// `loss[i] = -sum_j labels[i, j] * ln(p[i, j])`, where `p` is the row-wise
/// softmax of the scores ([`CrossEntropy::with_logits`]) or the scores
/// themselves when they already are probabilities
/// ([`CrossEntropy::from_probabilities`]). Only the scores receive a gradient.
#[derive(Debug, Clone, Copy)]
pub struct CrossEntropy {
    need_softmax: bool,
}

impl CrossEntropy {
    /// Scores are logits; a softmax is applied row-wise.
    pub fn with_logits() -> Self {
        CrossEntropy { need_softmax: true }
    }

    /// Scores are already normalized probabilities.
    pub fn from_probabilities() -> Self {
        CrossEntropy { need_softmax: false }
    }

    pub fn applies_softmax(&self) -> bool {
        self.need_softmax
    }

    fn check<'a>(
        &self,
        inputs: &[ValueRef<'a>],
    ) -> Result<(&'a DenseTensor<f32>, &'a SparseTensor), GnnError> {
        expect_arity(inputs, 2, self.name())?;
        let scores = inputs[0].as_dense(self.name())?;
        let labels = inputs[1].as_sparse(self.name())?;
        if scores.rank() != 2 || scores.shape() != labels.shape().as_slice() {
            return Err(GnnError::shape(&labels.shape(), scores.shape(), "CrossEntropy"));
        }
        Ok((scores, labels))
    }

    /// Row probabilities, recomputed on every call.
    fn probabilities(&self, scores: &DenseTensor<f32>) -> Vec<f32> {
        if !self.need_softmax {
            return scores.storage().to_vec();
        }
        let mut probs = vec![0.0f32; scores.numel()];
        scores
            .device()
            .backend()
            .softmax_rows(scores.storage(), scores.cols(), &mut probs);
        probs
    }
}

impl Default for CrossEntropy {
    fn default() -> Self {
        CrossEntropy::with_logits()
    }
}

impl Operator for CrossEntropy {
    fn name(&self) -> &str {
        "CrossEntropy"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 2, self.name())?;
        inputs[0].expect_kind(ValueKind::Dense, "CrossEntropy scores")?;
        inputs[1].expect_kind(ValueKind::Sparse, "CrossEntropy labels")?;
        let scores = inputs[0].shape.dims_of_rank(2, "CrossEntropy scores")?;
        let labels = inputs[1].shape.dims_of_rank(2, "CrossEntropy labels")?;
        let mismatch =
            |_| GnnError::shape(&inputs[1].shape.display_dims(), &inputs[0].shape.display_dims(), "CrossEntropy");
        let rows = unify_dim(scores[0], labels[0]).map_err(mismatch)?;
        unify_dim(scores[1], labels[1]).map_err(mismatch)?;
        Ok(TensorSpec::dense(vec![rows]))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        ensure_inputs_on(inputs, device, self.name())?;
        let (scores, labels) = self.check(inputs)?;
        let probs = self.probabilities(scores);
        let loss = output.dense_mut(self.name())?.prepare_output(&[scores.rows()]);
        device.backend().cross_entropy_rows(&probs, labels.csr(), loss);
        Ok(())
    }

    fn backward(
        &self,
        inputs: &[ValueRef<'_>],
        _output: &NodeValue,
        grad_output: &DenseTensor<f32>,
        grads: &mut GradSink<'_>,
    ) -> Result<(), GnnError> {
        let (scores, labels) = self.check(inputs)?;
        if grad_output.shape() != [scores.rows()].as_slice() {
            return Err(GnnError::shape(&[scores.rows()], grad_output.shape(), "CrossEntropy backward"));
        }
        let Some(grad_scores) = grads.grad_mut(0) else {
            return Ok(());
        };
        let probs = self.probabilities(scores);
        let backend = grad_output.device().backend();
        if self.need_softmax {
            backend.softmax_cross_entropy_backward(&probs, labels.csr(), grad_output.storage(), grad_scores.storage_mut());
        } else {
            backend.cross_entropy_backward(&probs, labels.csr(), grad_output.storage(), grad_scores.storage_mut());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cross_entropy_test.rs"]
mod tests;

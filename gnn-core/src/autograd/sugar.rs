//! Shorthand constructors for the built-in operators.

use crate::autograd::{FactorGraph, NodeId};
use crate::error::GnnError;
use crate::ops::{ArgMax, CrossEntropy, InTopK, MatMul, ReLU, ReduceMean, TypeCast};

impl FactorGraph {
    /// `a @ b`, see [`MatMul`].
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(MatMul, &[a, b])
    }

    /// See [`ReLU`].
    pub fn relu(&mut self, x: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(ReLU, &[x])
    }

    /// Per-row softmax cross-entropy of logits against sparse labels.
    pub fn cross_entropy(&mut self, logits: NodeId, labels: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(CrossEntropy::with_logits(), &[logits, labels])
    }

    /// Per-row cross-entropy of probabilities against sparse labels.
    pub fn cross_entropy_from_probabilities(&mut self, probabilities: NodeId, labels: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(CrossEntropy::from_probabilities(), &[probabilities, labels])
    }

    pub fn reduce_mean(&mut self, x: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(ReduceMean, &[x])
    }

    /// Column of each row's largest stored entry, see [`ArgMax`].
    pub fn arg_max(&mut self, x: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(ArgMax, &[x])
    }

    /// See [`InTopK`].
    pub fn in_top_k(&mut self, predictions: NodeId, targets: NodeId, k: usize) -> Result<NodeId, GnnError> {
        self.add_operator(InTopK::new(k), &[predictions, targets])
    }

    /// Converts to dense `f32`, see [`TypeCast`].
    pub fn type_cast(&mut self, x: NodeId) -> Result<NodeId, GnnError> {
        self.add_operator(TypeCast, &[x])
    }
}

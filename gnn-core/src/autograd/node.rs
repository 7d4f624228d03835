use std::fmt;

use crate::nn::Variable;
use crate::ops::{Operator, TensorSpec};

/// Handle on a node of one particular [`FactorGraph`](super::FactorGraph).
///
/// Handles carry the identity of the graph that minted them; passing a handle
/// to another graph fails with `GnnError::Dependency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) graph: u64,
    pub(crate) index: usize,
}

impl NodeId {
    /// Position of the node in insertion (topological) order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@graph{}", self.index, self.graph)
    }
}

/// Evaluation progress of a node. Reset to `Unevaluated` by every
/// `feed_forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unevaluated,
    Forwarded,
    GradientSeeded,
    Backpropagated,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    /// External input. `is_input` constants may be rebound on every step;
    /// the others accept a single binding.
    Constant { is_input: bool, bound: bool },
    /// Trainable variable; `param` indexes the owning parameter set.
    Param { variable: Variable, param: usize },
    Operator {
        op: Box<dyn Operator>,
        inputs: Vec<usize>,
    },
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) spec: TensorSpec,
    pub(crate) requires_grad: bool,
    pub(crate) state: NodeState,
}

impl Node {
    pub(crate) fn inputs(&self) -> &[usize] {
        match &self.kind {
            NodeKind::Operator { inputs, .. } => inputs,
            _ => &[],
        }
    }
}

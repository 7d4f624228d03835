//! Factor-graph construction and execution.
//!
//! A [`FactorGraph`] is built once from constants, variables and operator
//! instances, then evaluated repeatedly: [`FactorGraph::feed_forward`] binds
//! the input placeholders and computes the requested nodes,
//! [`FactorGraph::back_propagate`] accumulates gradients into the
//! [`ParamSet`](crate::nn::ParamSet) the variables belong to.

pub mod grad_check;
pub mod graph;
pub mod node;
mod sugar;

pub use graph::FactorGraph;
pub use node::{NodeId, NodeState};

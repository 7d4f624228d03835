//! Reverse-mode automatic differentiation over a static factor graph.
//!
//! A network is assembled once into a [`FactorGraph`] of constants
//! (placeholders bound on every step), variables (owned by a [`ParamSet`])
//! and [`Operator`](ops::Operator) instances. Each training step binds a batch,
//! runs [`FactorGraph::feed_forward`] on the requested outputs, seeds and runs
//! [`FactorGraph::back_propagate`], and lets an [`Optimizer`](optim::Optimizer)
//! update the parameter set.
//!
//! Tensors are tagged with a [`StorageDevice`]; every node of a graph executes
//! on the graph's device through the [`Device`](device::Device) backend.

pub mod autograd;
pub mod buffer;
pub mod device;
pub mod error;
pub mod model;
pub mod nn;
pub mod ops;
pub mod optim;
pub mod tensor;
pub mod types;
pub mod utils;

pub use autograd::{FactorGraph, NodeId, NodeState};
pub use device::StorageDevice;
pub use error::GnnError;
pub use nn::{ParamSet, Variable};
pub use tensor::{DenseTensor, SparseTensor};
pub use types::{DType, ValueKind};

//! # Operator library (`ops`)
//!
//! Every graph computation implements the [`Operator`] trait: a static
//! [`Operator::infer`] run once at graph construction, a
//! [`Operator::forward`] writing into a graph-owned output buffer, and a
//! [`Operator::backward`] adding contributions into graph-owned input
//! gradients through a [`GradSink`]. Kernels are reached through the device
//! backend, so operators never branch on where the data lives.
//!
//! ## Submodules
//!
//! - [`linalg`]: [`MatMul`].
//! - [`activation`]: [`ReLU`].
//! - [`loss`]: [`CrossEntropy`] (with or without the softmax).
//! - [`reduction`]: [`ReduceMean`], [`ArgMax`] over sparse rows.
//! - [`comparison`]: [`InTopK`].
//! - [`dtype`]: [`TypeCast`].

pub mod activation;
pub mod comparison;
pub mod dtype;
pub mod linalg;
pub mod loss;
pub mod operator;
pub mod reduction;
pub mod value;

pub use activation::ReLU;
pub use comparison::InTopK;
pub use dtype::TypeCast;
pub use linalg::MatMul;
pub use loss::CrossEntropy;
pub use operator::{GradSink, Operator};
pub use reduction::{ArgMax, ReduceMean};
pub use value::{NodeValue, ShapeHint, TensorSpec, ValueRef};

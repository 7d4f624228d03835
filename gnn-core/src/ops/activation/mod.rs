//! Activation functions.

pub mod relu;

pub use relu::ReLU;

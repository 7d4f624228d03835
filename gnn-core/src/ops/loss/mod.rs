//! # Loss Functions
//!
//! Losses comparing dense predictions against sparse (one-hot) targets.

pub mod cross_entropy;

pub use cross_entropy::CrossEntropy;

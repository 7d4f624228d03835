//! Trainable state: parameters and the set that owns them.

pub mod param_set;
pub mod parameter;

pub use param_set::{ParamSet, Variable};
pub use parameter::Parameter;

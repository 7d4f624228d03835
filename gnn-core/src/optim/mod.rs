//! Optimizers updating a [`ParamSet`](crate::nn::ParamSet) from its
//! accumulated gradients.

pub mod adam;
pub mod grad_clipping;
pub mod optimizer_state;
pub mod optimizer_trait;
pub mod sgd;

pub use adam::{Adam, AdamConfig};
pub use grad_clipping::{clip_grad_norm, global_grad_norm, GradClipping};
pub use optimizer_state::OptimizerState;
pub use optimizer_trait::Optimizer;
pub use sgd::{MomentumSgd, SgdConfig};

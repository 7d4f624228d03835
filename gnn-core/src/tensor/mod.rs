//! Tensor storage.
//!
//! - [`DenseTensor`]: row-major, device-tagged buffers of `f32` values or
//!   `i32` indices, with reshape/resize/copy/fill and random initialization.
//! - [`SparseTensor`]: 2-D compressed-row `f32` matrices, used for one-hot
//!   labels.

pub mod dense;
pub mod sparse;
pub mod utils;

pub use dense::DenseTensor;
pub use sparse::{CsrView, SparseTensor};

//! Execution devices.
//!
//! A tensor carries a [`StorageDevice`] tag telling where its data lives. The
//! tag resolves to a [`Device`] backend implementing the kernel contract every
//! operator and optimizer dispatches through, so operators are written once and
//! never branch on the device themselves.
//!
//! - [`HostDevice`] runs the kernels as plain sequential loops.
//! - [`AcceleratorDevice`] runs the same contract as data-parallel kernels.
//!   Each call still blocks until the result is materialized.

use std::fmt::Debug;

use crate::error::GnnError;
use crate::tensor::sparse::CsrView;

mod accelerator;
mod host;
pub(crate) mod kernels;

pub use accelerator::AcceleratorDevice;
pub use host::HostDevice;

/// Represents the physical location where tensor data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageDevice {
    /// Main system memory. This is the default device.
    #[default]
    Host,
    /// Accelerator memory. Host code cannot read it without an explicit
    /// `copy_from` transfer.
    Accelerator,
}

static HOST: HostDevice = HostDevice;
static ACCELERATOR: AcceleratorDevice = AcceleratorDevice;

impl StorageDevice {
    /// The kernel backend for this device.
    pub fn backend(self) -> &'static dyn Device {
        match self {
            StorageDevice::Host => &HOST,
            StorageDevice::Accelerator => &ACCELERATOR,
        }
    }
}

/// Whether a gemm operand is read transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    No,
    Yes,
}

/// Hyperparameters of one Adam element update.
#[derive(Debug, Clone, Copy)]
pub struct AdamStep {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    /// `1 - beta1^t`
    pub bias_correction1: f32,
    /// `1 - beta2^t`
    pub bias_correction2: f32,
    pub weight_decay: f32,
}

/// Hyperparameters of one momentum-SGD element update.
#[derive(Debug, Clone, Copy)]
pub struct SgdStep {
    pub lr: f32,
    pub momentum: f32,
    pub weight_decay: f32,
}

/// The tensor-operation contract every device provides.
///
/// Kernels work on flat row-major slices; shape bookkeeping stays with the
/// callers. Kernels named `*_backward` accumulate into their output gradient
/// instead of overwriting it.
pub trait Device: Debug + Send + Sync {
    /// The storage tag this backend executes on.
    fn kind(&self) -> StorageDevice;

    /// `c = alpha * op(a) * op(b) + beta * c` where `op(a)` is `m x k` and
    /// `op(b)` is `k x n`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[f32],
        b: &[f32],
        beta: f32,
        c: &mut [f32],
    );

    /// `y += alpha * x`
    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]);

    /// `x *= alpha`
    fn scale(&self, alpha: f32, x: &mut [f32]);

    /// `x = value`
    fn fill(&self, value: f32, x: &mut [f32]);

    /// `x += alpha`
    fn add_scalar(&self, alpha: f32, x: &mut [f32]);

    /// Sum of all elements, accumulated in f64.
    fn sum(&self, x: &[f32]) -> f64;

    /// Sum of squares, accumulated in f64.
    fn squared_norm(&self, x: &[f32]) -> f64;

    fn relu_forward(&self, x: &[f32], y: &mut [f32]);

    fn relu_backward(&self, x: &[f32], grad_output: &[f32], grad_input: &mut [f32]);

    /// Row-wise softmax of a `rows x cols` matrix.
    fn softmax_rows(&self, logits: &[f32], cols: usize, probs: &mut [f32]);

    /// `loss[i] = -sum_j labels[i, j] * ln(probs[i, j])` over the stored label entries.
    fn cross_entropy_rows(&self, probs: &[f32], labels: CsrView<'_>, loss: &mut [f32]);

    /// Gradient of softmax followed by cross-entropy w.r.t. the logits:
    /// `grad_logits[i, j] += grad_loss[i] * (probs[i, j] * sum(labels[i]) - labels[i, j])`.
    fn softmax_cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_logits: &mut [f32],
    );

    /// Gradient of cross-entropy w.r.t. probabilities:
    /// `grad_probs[i, j] += -grad_loss[i] * labels[i, j] / probs[i, j]`.
    fn cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_probs: &mut [f32],
    );

    /// Column index of the largest stored value per row, `-1` for empty rows.
    fn csr_arg_max(&self, matrix: CsrView<'_>, out: &mut [i32]);

    /// `out[i] = 1` if `labels[i]`'s score is within the top `k` of row `i`.
    fn in_top_k(&self, scores: &[f32], cols: usize, labels: &[i32], k: usize, out: &mut [i32]);

    fn cast_i32_to_f32(&self, x: &[i32], y: &mut [f32]);

    /// One momentum-SGD update over a parameter's elements.
    fn momentum_sgd_step(&self, step: SgdStep, value: &mut [f32], grad: &[f32], velocity: &mut [f32]);

    /// One Adam update over a parameter's elements.
    fn adam_step(&self, step: AdamStep, value: &mut [f32], grad: &[f32], m: &mut [f32], v: &mut [f32]);
}

/// Fails with `DeviceMismatch` unless `actual` equals `expected`.
pub(crate) fn ensure_device(
    expected: StorageDevice,
    actual: StorageDevice,
    operation: &str,
) -> Result<(), GnnError> {
    if expected != actual {
        return Err(GnnError::DeviceMismatch {
            expected,
            actual,
            operation: operation.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "device_test.rs"]
mod tests;

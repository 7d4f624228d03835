use rayon::prelude::*;

use super::kernels;
use super::{AdamStep, Device, SgdStep, StorageDevice, Transpose};
use crate::tensor::sparse::CsrView;

/// Minimum number of elements handed to one worker by element-wise kernels.
const ELEMENTWISE_GRAIN: usize = 4096;

/// Data-parallel kernels over accelerator memory.
///
/// Work is split across the rayon pool by rows (matrix kernels) or by element
/// ranges (element-wise kernels). Every call returns only once all workers are
/// done, so callers observe blocking semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceleratorDevice;

impl Device for AcceleratorDevice {
    fn kind(&self) -> StorageDevice {
        StorageDevice::Accelerator
    }

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
    ) {
        if n == 0 {
            return;
        }
        c[..m * n]
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, c_row)| {
                kernels::gemm_row(i, trans_a, trans_b, m, n, k, alpha, a, b, beta, c_row)
            });
    }

    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        y.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(x.par_iter())
            .for_each(|(y, &x)| *y += alpha * x);
    }

    fn scale(&self, alpha: f32, x: &mut [f32]) {
        x.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .for_each(|v| *v *= alpha);
    }

    fn fill(&self, value: f32, x: &mut [f32]) {
        x.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .for_each(|v| *v = value);
    }

    fn add_scalar(&self, alpha: f32, x: &mut [f32]) {
        x.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .for_each(|v| *v += alpha);
    }

    fn sum(&self, x: &[f32]) -> f64 {
        x.par_iter()
            .with_min_len(ELEMENTWISE_GRAIN)
            .map(|&v| v as f64)
            .sum()
    }

    fn squared_norm(&self, x: &[f32]) -> f64 {
        x.par_iter()
            .with_min_len(ELEMENTWISE_GRAIN)
            .map(|&v| (v as f64) * (v as f64))
            .sum()
    }

    fn relu_forward(&self, x: &[f32], y: &mut [f32]) {
        y.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(x.par_iter())
            .for_each(|(y, &x)| *y = x.max(0.0));
    }

    fn relu_backward(&self, x: &[f32], grad_output: &[f32], grad_input: &mut [f32]) {
        grad_input
            .par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(grad_output.par_iter())
            .zip(x.par_iter())
            .for_each(|((g_in, &g_out), &x)| kernels::relu_backward_elem(x, g_out, g_in));
    }

    fn softmax_rows(&self, logits: &[f32], cols: usize, probs: &mut [f32]) {
        if cols == 0 {
            return;
        }
        probs
            .par_chunks_mut(cols)
            .zip(logits.par_chunks(cols))
            .for_each(|(prob_row, logit_row)| kernels::softmax_row(logit_row, prob_row));
    }

    fn cross_entropy_rows(&self, probs: &[f32], labels: CsrView<'_>, loss: &mut [f32]) {
        let cols = labels.cols.max(1);
        loss.par_iter_mut()
            .zip(probs.par_chunks(cols))
            .enumerate()
            .for_each(|(i, (l, prob_row))| *l = kernels::cross_entropy_row(i, prob_row, &labels));
    }

    fn softmax_cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_logits: &mut [f32],
    ) {
        let cols = labels.cols.max(1);
        grad_logits
            .par_chunks_mut(cols)
            .zip(probs.par_chunks(cols))
            .enumerate()
            .for_each(|(i, (grad_row, prob_row))| {
                kernels::softmax_cross_entropy_backward_row(i, prob_row, &labels, grad_loss[i], grad_row)
            });
    }

    fn cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_probs: &mut [f32],
    ) {
        let cols = labels.cols.max(1);
        grad_probs
            .par_chunks_mut(cols)
            .zip(probs.par_chunks(cols))
            .enumerate()
            .for_each(|(i, (grad_row, prob_row))| {
                kernels::cross_entropy_backward_row(i, prob_row, &labels, grad_loss[i], grad_row)
            });
    }

    fn csr_arg_max(&self, matrix: CsrView<'_>, out: &mut [i32]) {
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, o)| *o = kernels::csr_arg_max_row(i, &matrix));
    }

    fn in_top_k(&self, scores: &[f32], cols: usize, labels: &[i32], k: usize, out: &mut [i32]) {
        if cols == 0 {
            out.fill(0);
            return;
        }
        out.par_iter_mut()
            .zip(scores.par_chunks(cols))
            .zip(labels.par_iter())
            .for_each(|((o, row), &label)| *o = kernels::in_top_k_row(row, label, k));
    }

    fn cast_i32_to_f32(&self, x: &[i32], y: &mut [f32]) {
        y.par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(x.par_iter())
            .for_each(|(y, &x)| *y = x as f32);
    }

    fn momentum_sgd_step(&self, step: SgdStep, value: &mut [f32], grad: &[f32], velocity: &mut [f32]) {
        value
            .par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(grad.par_iter())
            .zip(velocity.par_iter_mut())
            .for_each(|((w, &g), v)| kernels::momentum_sgd_elem(&step, w, g, v));
    }

    fn adam_step(&self, step: AdamStep, value: &mut [f32], grad: &[f32], m: &mut [f32], v: &mut [f32]) {
        value
            .par_iter_mut()
            .with_min_len(ELEMENTWISE_GRAIN)
            .zip(grad.par_iter())
            .zip(m.par_iter_mut())
            .zip(v.par_iter_mut())
            .for_each(|(((w, &g), m), v)| kernels::adam_elem(&step, w, g, m, v));
    }
}

use super::kernels;
use super::{AdamStep, Device, SgdStep, StorageDevice, Transpose};
use crate::tensor::sparse::CsrView;

/// Sequential kernels over host memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDevice;

impl Device for HostDevice {
    fn kind(&self) -> StorageDevice {
        StorageDevice::Host
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
        for (i, c_row) in c.chunks_mut(n).enumerate().take(m) {
            kernels::gemm_row(i, trans_a, trans_b, m, n, k, alpha, a, b, beta, c_row);
        }
    }

    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        for (y, &x) in y.iter_mut().zip(x) {
            *y += alpha * x;
        }
    }

    fn scale(&self, alpha: f32, x: &mut [f32]) {
        x.iter_mut().for_each(|v| *v *= alpha);
    }

    fn fill(&self, value: f32, x: &mut [f32]) {
        x.fill(value);
    }

    fn add_scalar(&self, alpha: f32, x: &mut [f32]) {
        x.iter_mut().for_each(|v| *v += alpha);
    }

    fn sum(&self, x: &[f32]) -> f64 {
        x.iter().map(|&v| v as f64).sum()
    }

    fn squared_norm(&self, x: &[f32]) -> f64 {
        x.iter().map(|&v| (v as f64) * (v as f64)).sum()
    }

    fn relu_forward(&self, x: &[f32], y: &mut [f32]) {
        for (y, &x) in y.iter_mut().zip(x) {
            *y = x.max(0.0);
        }
    }

    fn relu_backward(&self, x: &[f32], grad_output: &[f32], grad_input: &mut [f32]) {
        for ((g_in, &g_out), &x) in grad_input.iter_mut().zip(grad_output).zip(x) {
            kernels::relu_backward_elem(x, g_out, g_in);
        }
    }

    fn softmax_rows(&self, logits: &[f32], cols: usize, probs: &mut [f32]) {
        if cols == 0 {
            return;
        }
        for (logit_row, prob_row) in logits.chunks(cols).zip(probs.chunks_mut(cols)) {
            kernels::softmax_row(logit_row, prob_row);
        }
    }

    fn cross_entropy_rows(&self, probs: &[f32], labels: CsrView<'_>, loss: &mut [f32]) {
        let cols = labels.cols.max(1);
        for (i, (l, prob_row)) in loss.iter_mut().zip(probs.chunks(cols)).enumerate() {
            *l = kernels::cross_entropy_row(i, prob_row, &labels);
        }
    }

    fn softmax_cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_logits: &mut [f32],
    ) {
        let cols = labels.cols.max(1);
        for (i, (grad_row, prob_row)) in grad_logits.chunks_mut(cols).zip(probs.chunks(cols)).enumerate() {
            kernels::softmax_cross_entropy_backward_row(i, prob_row, &labels, grad_loss[i], grad_row);
        }
    }

    fn cross_entropy_backward(
        &self,
        probs: &[f32],
        labels: CsrView<'_>,
        grad_loss: &[f32],
        grad_probs: &mut [f32],
    ) {
        let cols = labels.cols.max(1);
        for (i, (grad_row, prob_row)) in grad_probs.chunks_mut(cols).zip(probs.chunks(cols)).enumerate() {
            kernels::cross_entropy_backward_row(i, prob_row, &labels, grad_loss[i], grad_row);
        }
    }

    fn csr_arg_max(&self, matrix: CsrView<'_>, out: &mut [i32]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = kernels::csr_arg_max_row(i, &matrix);
        }
    }

    fn in_top_k(&self, scores: &[f32], cols: usize, labels: &[i32], k: usize, out: &mut [i32]) {
        if cols == 0 {
            out.fill(0);
            return;
        }
        for ((o, row), &label) in out.iter_mut().zip(scores.chunks(cols)).zip(labels) {
            *o = kernels::in_top_k_row(row, label, k);
        }
    }

    fn cast_i32_to_f32(&self, x: &[i32], y: &mut [f32]) {
        for (y, &x) in y.iter_mut().zip(x) {
            *y = x as f32;
        }
    }

    fn momentum_sgd_step(&self, step: SgdStep, value: &mut [f32], grad: &[f32], velocity: &mut [f32]) {
        for ((w, &g), v) in value.iter_mut().zip(grad).zip(velocity.iter_mut()) {
            kernels::momentum_sgd_elem(&step, w, g, v);
        }
    }

    fn adam_step(&self, step: AdamStep, value: &mut [f32], grad: &[f32], m: &mut [f32], v: &mut [f32]) {
        for (((w, &g), m), v) in value.iter_mut().zip(grad).zip(m.iter_mut()).zip(v.iter_mut()) {
            kernels::adam_elem(&step, w, g, m, v);
        }
    }
}

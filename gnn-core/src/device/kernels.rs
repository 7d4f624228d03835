// Per-row and per-element kernel bodies shared by both backends. The host
// backend loops over them sequentially, the accelerator backend in parallel.

use super::{AdamStep, SgdStep, Transpose};
use crate::tensor::sparse::CsrView;

/// Smallest probability fed to `ln`, keeps the loss finite for saturated rows.
const MIN_PROB: f32 = 1e-30;

/// Computes row `i` of `c = alpha * op(a) * op(b) + beta * c`.
#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_row(
    i: usize,
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    b: &[f32],
    beta: f32,
    c_row: &mut [f32],
) {
    if beta == 0.0 {
        c_row.fill(0.0);
    } else if beta != 1.0 {
        c_row.iter_mut().for_each(|c| *c *= beta);
    }
    for l in 0..k {
        let a_il = match trans_a {
            Transpose::No => a[i * k + l],
            Transpose::Yes => a[l * m + i],
        };
        if a_il == 0.0 {
            continue;
        }
        let factor = alpha * a_il;
        match trans_b {
            Transpose::No => {
                let b_row = &b[l * n..(l + 1) * n];
                for (c, &b_lj) in c_row.iter_mut().zip(b_row) {
                    *c += factor * b_lj;
                }
            }
            Transpose::Yes => {
                for (j, c) in c_row.iter_mut().enumerate() {
                    *c += factor * b[j * k + l];
                }
            }
        }
    }
}

#[inline]
pub(crate) fn relu_backward_elem(x: f32, grad_output: f32, grad_input: &mut f32) {
    if x > 0.0 {
        *grad_input += grad_output;
    }
}

pub(crate) fn softmax_row(logits: &[f32], probs: &mut [f32]) {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut total = 0.0f32;
    for (p, &x) in probs.iter_mut().zip(logits) {
        *p = (x - max).exp();
        total += *p;
    }
    if total > 0.0 {
        probs.iter_mut().for_each(|p| *p /= total);
    }
}

pub(crate) fn cross_entropy_row(i: usize, probs_row: &[f32], labels: &CsrView<'_>) -> f32 {
    let mut loss = 0.0f32;
    for (col, value) in labels.row(i) {
        loss -= value * probs_row[col].max(MIN_PROB).ln();
    }
    loss
}

pub(crate) fn softmax_cross_entropy_backward_row(
    i: usize,
    probs_row: &[f32],
    labels: &CsrView<'_>,
    grad_loss: f32,
    grad_row: &mut [f32],
) {
    let label_mass: f32 = labels.row(i).map(|(_, v)| v).sum();
    for (g, &p) in grad_row.iter_mut().zip(probs_row) {
        *g += grad_loss * p * label_mass;
    }
    for (col, value) in labels.row(i) {
        grad_row[col] -= grad_loss * value;
    }
}

pub(crate) fn cross_entropy_backward_row(
    i: usize,
    probs_row: &[f32],
    labels: &CsrView<'_>,
    grad_loss: f32,
    grad_row: &mut [f32],
) {
    for (col, value) in labels.row(i) {
        grad_row[col] -= grad_loss * value / probs_row[col].max(MIN_PROB);
    }
}

pub(crate) fn csr_arg_max_row(i: usize, matrix: &CsrView<'_>) -> i32 {
    let mut best: Option<(usize, f32)> = None;
    for (col, value) in matrix.row(i) {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((col, value)),
        }
    }
    best.map_or(-1, |(col, _)| col as i32)
}

pub(crate) fn in_top_k_row(scores_row: &[f32], label: i32, k: usize) -> i32 {
    if label < 0 || label as usize >= scores_row.len() {
        return 0;
    }
    let target = scores_row[label as usize];
    if !target.is_finite() {
        return 0;
    }
    let better = scores_row.iter().filter(|&&s| s > target).count();
    i32::from(better < k)
}

#[inline]
pub(crate) fn momentum_sgd_elem(step: &SgdStep, value: &mut f32, grad: f32, velocity: &mut f32) {
    *velocity = step.momentum * *velocity + grad + step.weight_decay * *value;
    *value -= step.lr * *velocity;
}

#[inline]
pub(crate) fn adam_elem(step: &AdamStep, value: &mut f32, grad: f32, m: &mut f32, v: &mut f32) {
    let g = grad + step.weight_decay * *value;
    *m = step.beta1 * *m + (1.0 - step.beta1) * g;
    *v = step.beta2 * *v + (1.0 - step.beta2) * g * g;
    let m_hat = *m / step.bias_correction1;
    let v_hat = *v / step.bias_correction2;
    *value -= step.lr * m_hat / (v_hat.sqrt() + step.eps);
}

use super::*;
use crate::tensor::SparseTensor;
use approx::assert_relative_eq;

fn backends() -> [&'static dyn Device; 2] {
    [StorageDevice::Host.backend(), StorageDevice::Accelerator.backend()]
}

fn assert_slices_near(a: &[f32], b: &[f32], eps: f32) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_relative_eq!(*x, *y, epsilon = eps);
    }
}

#[test]
fn test_backend_kinds() {
    assert_eq!(StorageDevice::Host.backend().kind(), StorageDevice::Host);
    assert_eq!(StorageDevice::Accelerator.backend().kind(), StorageDevice::Accelerator);
    assert_eq!(StorageDevice::default(), StorageDevice::Host);
}

#[test]
fn test_gemm_all_transpose_combinations() {
    // a: 2x3, b: 3x2
    let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0];
    let expected = [58.0f32, 64.0, 139.0, 154.0];
    // Transposed storage of the same matrices.
    let a_t = [1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0];
    let b_t = [7.0f32, 9.0, 11.0, 8.0, 10.0, 12.0];

    for device in backends() {
        for (ta, tb, lhs, rhs) in [
            (Transpose::No, Transpose::No, &a, &b),
            (Transpose::Yes, Transpose::No, &a_t, &b),
            (Transpose::No, Transpose::Yes, &a, &b_t),
            (Transpose::Yes, Transpose::Yes, &a_t, &b_t),
        ] {
            let mut c = [0.0f32; 4];
            device.gemm(ta, tb, 2, 2, 3, 1.0, lhs, rhs, 0.0, &mut c);
            assert_slices_near(&c, &expected, 1e-5);
        }
    }
}

#[test]
fn test_gemm_beta_accumulates() {
    let a = [1.0f32, 0.0, 0.0, 1.0];
    let b = [2.0f32, 3.0, 4.0, 5.0];
    for device in backends() {
        let mut c = [1.0f32; 4];
        device.gemm(Transpose::No, Transpose::No, 2, 2, 2, 0.5, &a, &b, 1.0, &mut c);
        assert_slices_near(&c, &[2.0, 2.5, 3.0, 3.5], 1e-6);
    }
}

#[test]
fn test_elementwise_parity_on_large_inputs() {
    let n = 10_000;
    let x: Vec<f32> = (0..n).map(|i| ((i % 97) as f32 - 48.0) / 10.0).collect();
    let host = StorageDevice::Host.backend();
    let acc = StorageDevice::Accelerator.backend();

    let mut y_host = vec![0.0f32; n];
    let mut y_acc = vec![0.0f32; n];
    host.relu_forward(&x, &mut y_host);
    acc.relu_forward(&x, &mut y_acc);
    assert_eq!(y_host, y_acc);

    let mut g_host = vec![1.0f32; n];
    let mut g_acc = vec![1.0f32; n];
    host.relu_backward(&x, &x, &mut g_host);
    acc.relu_backward(&x, &x, &mut g_acc);
    assert_eq!(g_host, g_acc);

    assert_relative_eq!(host.sum(&x), acc.sum(&x), epsilon = 1e-6);
    assert_relative_eq!(host.squared_norm(&x), acc.squared_norm(&x), max_relative = 1e-9);

    let mut s_host = x.clone();
    let mut s_acc = x.clone();
    host.axpy(2.0, &x, &mut s_host);
    acc.axpy(2.0, &x, &mut s_acc);
    host.scale(0.5, &mut s_host);
    acc.scale(0.5, &mut s_acc);
    assert_eq!(s_host, s_acc);

    host.add_scalar(1.0, &mut s_host);
    acc.add_scalar(1.0, &mut s_acc);
    assert_eq!(s_host, s_acc);
    host.fill(0.25, &mut s_host);
    acc.fill(0.25, &mut s_acc);
    assert!(s_host.iter().chain(&s_acc).all(|&v| v == 0.25));
}

#[test]
fn test_softmax_rows_sum_to_one() {
    let logits = [1.0f32, 2.0, 3.0, 1000.0, 1000.0, 1000.0];
    for device in backends() {
        let mut probs = [0.0f32; 6];
        device.softmax_rows(&logits, 3, &mut probs);
        assert_relative_eq!(probs[..3].iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(probs[2], 0.665_240_9, epsilon = 1e-6);
        assert_slices_near(&probs[3..], &[1.0 / 3.0; 3], 1e-6);
    }
}

#[test]
fn test_cross_entropy_and_backward() {
    let labels = SparseTensor::from_one_hot(&[2, 0], 3, StorageDevice::Host).unwrap();
    let logits = [1.0f32, 2.0, 3.0, 0.0, 0.0, 0.0];
    for device in backends() {
        let mut probs = [0.0f32; 6];
        device.softmax_rows(&logits, 3, &mut probs);

        let mut loss = [0.0f32; 2];
        device.cross_entropy_rows(&probs, labels.csr(), &mut loss);
        assert_relative_eq!(loss[0], -(0.665_240_9f32).ln(), epsilon = 1e-5);
        assert_relative_eq!(loss[1], 3.0f32.ln(), epsilon = 1e-5);

        let mut grad = [0.0f32; 6];
        device.softmax_cross_entropy_backward(&probs, labels.csr(), &[1.0, 2.0], &mut grad);
        assert_slices_near(
            &grad,
            &[
                probs[0],
                probs[1],
                probs[2] - 1.0,
                2.0 * (1.0 / 3.0 - 1.0),
                2.0 / 3.0,
                2.0 / 3.0,
            ],
            1e-5,
        );
    }
}

#[test]
fn test_csr_arg_max_and_in_top_k() {
    let matrix = SparseTensor::from_csr(
        3,
        4,
        vec![0, 2, 2, 3],
        vec![1, 3, 2],
        vec![0.5, 0.7, 0.1],
        StorageDevice::Host,
    )
    .unwrap();
    let scores = [0.1f32, 0.9, 0.9, 0.0, 0.3, 0.2, 0.1, 0.0];
    for device in backends() {
        let mut arg = [0i32; 3];
        device.csr_arg_max(matrix.csr(), &mut arg);
        assert_eq!(arg, [3, -1, 2]);

        let mut hit = [7i32; 2];
        // Tie at the top counts as a hit; out-of-range label is a miss.
        device.in_top_k(&scores, 4, &[2, 4], 1, &mut hit);
        assert_eq!(hit, [1, 0]);
        device.in_top_k(&scores, 4, &[3, 1], 2, &mut hit);
        assert_eq!(hit, [0, 1]);
    }
}

#[test]
fn test_optimizer_steps_match() {
    let adam = AdamStep {
        lr: 0.1,
        beta1: 0.9,
        beta2: 0.999,
        eps: 1e-8,
        bias_correction1: 1.0 - 0.9,
        bias_correction2: 1.0 - 0.999,
        weight_decay: 0.0,
    };
    let sgd = SgdStep {
        lr: 0.1,
        momentum: 0.9,
        weight_decay: 0.0,
    };
    for device in backends() {
        let mut w = [1.0f32, -1.0];
        let (mut m, mut v) = ([0.0f32; 2], [0.0f32; 2]);
        device.adam_step(adam, &mut w, &[0.5, -2.0], &mut m, &mut v);
        // First Adam step moves every weight by ~lr against the gradient sign.
        assert_slices_near(&w, &[0.9, -0.9], 1e-5);

        let mut w = [1.0f32];
        let mut vel = [1.0f32];
        device.momentum_sgd_step(sgd, &mut w, &[1.0], &mut vel);
        assert_slices_near(&vel, &[1.9], 1e-6);
        assert_slices_near(&w, &[0.81], 1e-6);

        let mut y = [0.0f32; 3];
        device.cast_i32_to_f32(&[1, 0, -1], &mut y);
        assert_eq!(y, [1.0, 0.0, -1.0]);
    }
}

#[test]
fn test_ensure_device() {
    assert!(ensure_device(StorageDevice::Host, StorageDevice::Host, "op").is_ok());
    assert_eq!(
        ensure_device(StorageDevice::Host, StorageDevice::Accelerator, "op"),
        Err(GnnError::DeviceMismatch {
            expected: StorageDevice::Host,
            actual: StorageDevice::Accelerator,
            operation: "op".to_string(),
        })
    );
}

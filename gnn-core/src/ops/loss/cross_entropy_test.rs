use super::*;
use crate::ops::ShapeHint;
use crate::utils::testing::{backprop_operator, check_tensor_near, create_one_hot, create_test_tensor, eval_operator};
use approx::assert_relative_eq;

fn loss_of(op: CrossEntropy, scores: &DenseTensor<f32>, labels: &SparseTensor) -> Vec<f32> {
    let out = eval_operator(&op, &[ValueRef::Dense(scores), ValueRef::Sparse(labels)], StorageDevice::Host).unwrap();
    match out {
        NodeValue::Dense(t) => t.to_vec(),
        other => panic!("expected dense loss, got {:?}", other.kind()),
    }
}

#[test]
fn test_uniform_logits_give_ln_classes() {
    let scores = DenseTensor::<f32>::zeros(&[4, 10], StorageDevice::Host);
    let labels = create_one_hot(&[0, 3, 9, 5], 10);
    for loss in loss_of(CrossEntropy::with_logits(), &scores, &labels) {
        assert_relative_eq!(loss, 10.0f32.ln(), epsilon = 1e-5);
    }
}

#[test]
fn test_from_probabilities_skips_softmax() {
    let probs = create_test_tensor(vec![0.25, 0.75, 0.5, 0.5], vec![2, 2]);
    let labels = create_one_hot(&[1, 0], 2);
    let loss = loss_of(CrossEntropy::from_probabilities(), &probs, &labels);
    assert_relative_eq!(loss[0], -(0.75f32).ln(), epsilon = 1e-6);
    assert_relative_eq!(loss[1], -(0.5f32).ln(), epsilon = 1e-6);
}

#[test]
fn test_softmax_backward_is_probs_minus_labels() {
    let scores = create_test_tensor(vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0], vec![2, 3]);
    let labels = create_one_hot(&[2, 1], 3);
    let inputs = [ValueRef::Dense(&scores), ValueRef::Sparse(&labels)];
    let op = CrossEntropy::with_logits();
    let out = eval_operator(&op, &inputs, StorageDevice::Host).unwrap();
    let grad_output = create_test_tensor(vec![1.0, 0.5], vec![2]);

    let grads = backprop_operator(&op, &inputs, &out, &grad_output).unwrap();
    let (p0, p1, p2) = (0.090_030_57, 0.244_728_47, 0.665_240_9);
    let third = 1.0 / 3.0;
    check_tensor_near(
        grads[0].as_ref().unwrap(),
        &[2, 3],
        &[p0, p1, p2 - 1.0, 0.5 * third, 0.5 * (third - 1.0), 0.5 * third],
        1e-5,
    );
    assert!(grads[1].is_none(), "labels never receive a gradient");
}

#[test]
fn test_probabilities_backward() {
    let probs = create_test_tensor(vec![0.25, 0.75], vec![1, 2]);
    let labels = create_one_hot(&[1], 2);
    let inputs = [ValueRef::Dense(&probs), ValueRef::Sparse(&labels)];
    let op = CrossEntropy::from_probabilities();
    let out = eval_operator(&op, &inputs, StorageDevice::Host).unwrap();
    let grad_output = create_test_tensor(vec![1.0], vec![1]);

    let grads = backprop_operator(&op, &inputs, &out, &grad_output).unwrap();
    check_tensor_near(grads[0].as_ref().unwrap(), &[1, 2], &[0.0, -1.0 / 0.75], 1e-5);
}

#[test]
fn test_label_shape_must_match_scores() {
    let scores = DenseTensor::<f32>::zeros(&[2, 3], StorageDevice::Host);
    let labels = create_one_hot(&[0, 1], 4);
    let mut out = NodeValue::empty(ValueKind::Dense, StorageDevice::Host);
    let result = CrossEntropy::with_logits().forward(
        &[ValueRef::Dense(&scores), ValueRef::Sparse(&labels)],
        &mut out,
        StorageDevice::Host,
    );
    assert!(matches!(result, Err(GnnError::Shape { .. })));
}

#[test]
fn test_infer_output_is_row_vector() {
    let op = CrossEntropy::with_logits();
    let logits = TensorSpec::dense(vec![None, Some(10)]);
    let labels = TensorSpec::new(ValueKind::Sparse, ShapeHint::Unknown);
    assert_eq!(op.infer(&[logits.clone(), labels]).unwrap(), TensorSpec::dense(vec![None]));

    let wrong_kind = TensorSpec::dense(vec![None, Some(10)]);
    assert!(matches!(op.infer(&[logits, wrong_kind]), Err(GnnError::DataTypeMismatch { .. })));
}

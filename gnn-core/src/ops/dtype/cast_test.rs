use super::*;
use crate::utils::testing::{backprop_operator, check_tensor_near, create_test_tensor, eval_operator};

#[test]
fn test_cast_int_to_dense() {
    let x = DenseTensor::from_vec(vec![1i32, 0, 1, 1], &[4], StorageDevice::Host).unwrap();
    let out = eval_operator(&TypeCast, &[ValueRef::Int(&x)], StorageDevice::Host).unwrap();
    let NodeValue::Dense(y) = out else {
        panic!("TypeCast must produce a dense value");
    };
    check_tensor_near(&y, &[4], &[1.0, 0.0, 1.0, 1.0], 0.0);
}

#[test]
fn test_cast_dense_is_identity_with_gradient() {
    let x = create_test_tensor(vec![0.5, -1.5], vec![2]);
    let inputs = [ValueRef::Dense(&x)];
    let out = eval_operator(&TypeCast, &inputs, StorageDevice::Host).unwrap();
    assert_eq!(out, NodeValue::Dense(x.clone()));

    let grad_output = create_test_tensor(vec![3.0, 4.0], vec![2]);
    let grads = backprop_operator(&TypeCast, &inputs, &out, &grad_output).unwrap();
    check_tensor_near(grads[0].as_ref().unwrap(), &[2], &[3.0, 4.0], 0.0);
}

#[test]
fn test_cast_rejects_sparse() {
    let spec = TensorSpec::new(ValueKind::Sparse, crate::ops::ShapeHint::Unknown);
    assert!(matches!(TypeCast.infer(&[spec]), Err(GnnError::DataTypeMismatch { .. })));
}

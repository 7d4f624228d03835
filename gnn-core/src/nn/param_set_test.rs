use super::*;
use crate::utils::testing::{check_tensor_near, create_test_tensor};

#[test]
fn test_add_and_lookup() {
    let mut params = ParamSet::new(StorageDevice::Host);
    let w = params.add("w1", &[784, 1024]).unwrap();
    let b = params.add("b1", &[1024]).unwrap();

    assert_eq!(w.name(), "w1");
    assert_eq!(params.len(), 2);
    assert_eq!(params.total_elements(), 784 * 1024 + 1024);
    assert_eq!(params.variable("b1"), Some(b.clone()));
    assert_eq!(params.value(&b).unwrap().shape(), &[1024]);
    assert!(params.variable("missing").is_none());
}

#[test]
fn test_duplicate_name_rejected() {
    let mut params = ParamSet::new(StorageDevice::Host);
    params.add("w", &[2]).unwrap();
    assert_eq!(
        params.add("w", &[3]),
        Err(GnnError::DuplicateName { name: "w".to_string() })
    );
    assert_eq!(params.len(), 1);
}

#[test]
fn test_accumulate_adds_instead_of_overwriting() {
    let mut params = ParamSet::new(StorageDevice::Host);
    let w = params.add("w", &[2, 2]).unwrap();
    let delta = create_test_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);

    params.accumulate_gradient("w", &delta).unwrap();
    params.accumulate_gradient("w", &delta).unwrap();
    check_tensor_near(params.gradient(&w).unwrap(), &[2, 2], &[2.0, 4.0, 6.0, 8.0], 1e-6);

    params.zero_gradients();
    check_tensor_near(params.gradient(&w).unwrap(), &[2, 2], &[0.0; 4], 0.0);
}

#[test]
fn test_accumulate_errors() {
    let mut params = ParamSet::new(StorageDevice::Host);
    params.add("w", &[2, 2]).unwrap();

    let wrong_shape = create_test_tensor(vec![1.0; 4], vec![4]);
    assert!(matches!(
        params.accumulate_gradient("w", &wrong_shape),
        Err(GnnError::Shape { .. })
    ));

    let other_device = DenseTensor::<f32>::zeros(&[2, 2], StorageDevice::Accelerator);
    assert!(matches!(
        params.accumulate_gradient("w", &other_device),
        Err(GnnError::DeviceMismatch { .. })
    ));

    assert!(matches!(
        params.accumulate_gradient("nope", &wrong_shape),
        Err(GnnError::UnknownPlaceholder { .. })
    ));
}

#[test]
fn test_foreign_handle_rejected() {
    let mut a = ParamSet::new(StorageDevice::Host);
    let mut b = ParamSet::new(StorageDevice::Host);
    a.add("w", &[1]).unwrap();
    let foreign = b.add("w", &[1]).unwrap();
    assert!(matches!(a.value(&foreign), Err(GnnError::Dependency { .. })));
    assert!(matches!(a.value_mut(&foreign), Err(GnnError::Dependency { .. })));
}

#[test]
fn test_accelerator_params() {
    let mut params = ParamSet::new(StorageDevice::Accelerator);
    let w = params.add("w", &[3]).unwrap();
    assert_eq!(params.value(&w).unwrap().device(), StorageDevice::Accelerator);

    let mut delta = DenseTensor::<f32>::new(StorageDevice::Accelerator);
    delta.copy_from(&create_test_tensor(vec![1.0, -1.0, 0.5], vec![3])).unwrap();
    params.accumulate_gradient("w", &delta).unwrap();
    check_tensor_near(params.gradient(&w).unwrap(), &[3], &[1.0, -1.0, 0.5], 1e-6);
}

use super::*;
use crate::device::StorageDevice;
use crate::utils::testing::create_test_tensor;
use approx::assert_relative_eq;

fn param_with_grad(value: Vec<f32>, grad: Vec<f32>, device: StorageDevice) -> ParamSet {
    let mut params = ParamSet::new(device);
    let shape = vec![value.len()];
    let var = params.add("p", &shape).unwrap();
    params
        .value_mut(&var)
        .unwrap()
        .copy_from(&create_test_tensor(value, shape.clone()))
        .unwrap();
    params
        .accumulate_gradient("p", &create_test_tensor(grad, shape).to_device(device))
        .unwrap();
    params
}

fn assert_vec_f32_eq(a: &[f32], b: &[f32], epsilon: f32) {
    assert_eq!(a.len(), b.len());
    for (val_a, val_b) in a.iter().zip(b) {
        assert_relative_eq!(*val_a, *val_b, epsilon = epsilon);
    }
}

#[test]
fn test_sgd_basic_step() {
    let mut params = param_with_grad(vec![1.0, 2.0, 3.0, 4.0], vec![0.1, 0.2, 0.3, 0.4], StorageDevice::Host);
    let mut sgd = MomentumSgd::new(SgdConfig {
        learning_rate: 0.1,
        momentum: 0.0,
        ..SgdConfig::default()
    })
    .unwrap();

    sgd.update(&mut params).unwrap();
    assert_vec_f32_eq(&params.get("p").unwrap().value().to_vec(), &[0.99, 1.98, 2.97, 3.96], 1e-6);
    assert!(params.get("p").unwrap().grad().to_vec().iter().all(|&g| g == 0.0));
}

#[test]
fn test_sgd_momentum_and_weight_decay() {
    let mut params = param_with_grad(vec![1.0], vec![0.5], StorageDevice::Host);
    let mut sgd = MomentumSgd::new(SgdConfig {
        learning_rate: 0.1,
        momentum: 0.9,
        weight_decay: 0.1,
        clipping: GradClipping::default(),
    })
    .unwrap();

    // v = 0.5 + 0.1 * 1.0 = 0.6, value = 1.0 - 0.06 = 0.94
    sgd.update(&mut params).unwrap();
    assert_relative_eq!(params.get("p").unwrap().value().to_vec()[0], 0.94, epsilon = 1e-6);

    // v = 0.9 * 0.6 + 0.5 + 0.1 * 0.94 = 1.134, value = 0.94 - 0.1134
    params
        .accumulate_gradient("p", &create_test_tensor(vec![0.5], vec![1]))
        .unwrap();
    sgd.update(&mut params).unwrap();
    assert_relative_eq!(params.get("p").unwrap().value().to_vec()[0], 0.8266, epsilon = 1e-5);
    assert_eq!(sgd.state().get("p").unwrap()[0].to_vec().len(), 1);
}

#[test]
fn test_sgd_on_accelerator_matches_host() {
    let config = SgdConfig {
        learning_rate: 0.05,
        momentum: 0.5,
        weight_decay: 0.01,
        clipping: GradClipping::default(),
    };
    let value: Vec<f32> = (0..5000).map(|i| (i as f32 * 0.37).sin()).collect();
    let grad: Vec<f32> = (0..5000).map(|i| (i as f32 * 0.11).cos()).collect();
    let mut host = param_with_grad(value.clone(), grad.clone(), StorageDevice::Host);
    let mut acc = param_with_grad(value, grad, StorageDevice::Accelerator);

    MomentumSgd::new(config).unwrap().update(&mut host).unwrap();
    MomentumSgd::new(config).unwrap().update(&mut acc).unwrap();
    assert_vec_f32_eq(
        &acc.get("p").unwrap().value().to_vec(),
        &host.get("p").unwrap().value().to_vec(),
        1e-6,
    );
}

#[test]
fn test_sgd_invalid_config() {
    let bad_lr = SgdConfig {
        learning_rate: 0.0,
        ..SgdConfig::default()
    };
    assert!(matches!(MomentumSgd::new(bad_lr), Err(GnnError::ConfigurationError(_))));

    let bad_momentum = SgdConfig {
        momentum: 1.0,
        ..SgdConfig::default()
    };
    assert!(matches!(MomentumSgd::new(bad_momentum), Err(GnnError::ConfigurationError(_))));

    let bad_clip = SgdConfig {
        clipping: GradClipping::with_max_norm(-1.0),
        ..SgdConfig::default()
    };
    assert!(matches!(MomentumSgd::new(bad_clip), Err(GnnError::ConfigurationError(_))));
}

#[test]
fn test_sgd_learning_rate_accessors() {
    let mut sgd = MomentumSgd::new(SgdConfig::default()).unwrap();
    assert_eq!(sgd.learning_rate(), 0.01);
    sgd.set_learning_rate(0.5).unwrap();
    assert_eq!(sgd.learning_rate(), 0.5);
    assert!(sgd.set_learning_rate(f32::NAN).is_err());
    assert_eq!(sgd.learning_rate(), 0.5);
}

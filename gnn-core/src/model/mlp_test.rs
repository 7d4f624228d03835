use super::*;
use crate::device::StorageDevice;
use crate::ops::ValueRef;
use crate::utils::testing::{create_one_hot, create_test_tensor};
use approx::assert_relative_eq;

fn small_config(init_std: f32) -> MlpConfig {
    MlpConfig {
        input_dim: 4,
        hidden_dims: vec![5],
        classes: 3,
        init_std,
        seed: Some(11),
    }
}

#[test]
fn test_default_config_matches_mnist_topology() {
    let config = MlpConfig::default();
    assert_eq!(config.input_dim, 784);
    assert_eq!(config.hidden_dims, vec![1024, 1024]);
    assert_eq!(config.classes, 10);
    assert_eq!(config.init_std, 0.01);
    assert!(config.validate().is_ok());
}

#[test]
fn test_build_registers_weights() {
    let mut params = ParamSet::new(StorageDevice::Host);
    let mut graph = FactorGraph::new(StorageDevice::Host);
    let mlp = Mlp::build(&small_config(0.01), &mut params, &mut graph).unwrap();

    let names: Vec<&str> = mlp.weights.iter().map(|w| w.name()).collect();
    assert_eq!(names, vec!["w1", "wo"]);
    assert_eq!(params.get("w1").unwrap().shape(), &[4, 5]);
    assert_eq!(params.get("wo").unwrap().shape(), &[5, 3]);
    assert_eq!(params.total_elements(), 35);
    assert!(graph.node_by_name(FEATURES).is_some());
    assert!(graph.node_by_name(LABELS).is_some());
    assert!(graph.requires_grad(mlp.loss).unwrap());
    assert!(!graph.requires_grad(mlp.accuracy).unwrap());
}

#[test]
fn test_zero_weights_give_uniform_prediction() {
    let mut params = ParamSet::new(StorageDevice::Host);
    let mut graph = FactorGraph::new(StorageDevice::Host);
    let mlp = Mlp::build(&small_config(0.0), &mut params, &mut graph).unwrap();

    let x = create_test_tensor(vec![0.5; 8], vec![2, 4]);
    let y = create_one_hot(&[0, 2], 3);
    graph
        .feed_forward(
            &params,
            &[mlp.loss, mlp.accuracy],
            &[(FEATURES, ValueRef::Dense(&x)), (LABELS, ValueRef::Sparse(&y))],
        )
        .unwrap();

    assert_relative_eq!(graph.as_scalar(mlp.loss).unwrap(), 3f32.ln(), epsilon = 1e-6);
    // All scores tie, which counts as a hit.
    assert_eq!(graph.as_scalar(mlp.accuracy).unwrap(), 1.0);
}

#[test]
fn test_seed_makes_initialization_reproducible() {
    let build = || {
        let mut params = ParamSet::new(StorageDevice::Host);
        let mut graph = FactorGraph::new(StorageDevice::Host);
        Mlp::build(&small_config(0.1), &mut params, &mut graph).unwrap();
        params.get("w1").unwrap().value().to_vec()
    };
    let first = build();
    assert_eq!(first, build());
    assert!(first.iter().any(|&v| v != 0.0));
}

#[test]
fn test_invalid_config_and_duplicate_build() {
    let mut params = ParamSet::new(StorageDevice::Host);
    let mut graph = FactorGraph::new(StorageDevice::Host);
    let zero_hidden = MlpConfig {
        hidden_dims: vec![0],
        ..small_config(0.01)
    };
    assert!(matches!(
        Mlp::build(&zero_hidden, &mut params, &mut graph),
        Err(GnnError::ConfigurationError(_))
    ));
    assert!(matches!(
        Mlp::build(&small_config(-1.0), &mut params, &mut graph),
        Err(GnnError::ConfigurationError(_))
    ));

    Mlp::build(&small_config(0.01), &mut params, &mut graph).unwrap();
    assert!(matches!(
        Mlp::build(&small_config(0.01), &mut params, &mut graph),
        Err(GnnError::DuplicateName { .. })
    ));
}

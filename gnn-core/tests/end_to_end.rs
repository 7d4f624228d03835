mod common;

use approx::assert_relative_eq;
use gnn_core::model::mlp::{FEATURES, LABELS};
use gnn_core::model::{Mlp, MlpConfig};
use gnn_core::ops::ValueRef;
use gnn_core::optim::{Adam, AdamConfig, Optimizer};
use gnn_core::tensor::{DenseTensor, SparseTensor};
use gnn_core::{FactorGraph, NodeState, ParamSet, StorageDevice};

fn mnist_mlp(device: StorageDevice) -> (ParamSet, FactorGraph, Mlp) {
    let mut params = ParamSet::new(device);
    let mut graph = FactorGraph::new(device);
    let config = MlpConfig {
        seed: Some(2017),
        ..MlpConfig::default()
    };
    let mlp = Mlp::build(&config, &mut params, &mut graph).expect("build mlp");
    (params, graph, mlp)
}

#[test]
fn test_forward_on_zero_inputs() {
    common::init_logging();
    let (params, mut graph, mlp) = mnist_mlp(StorageDevice::Host);
    assert_eq!(params.total_elements(), 784 * 1024 + 1024 * 1024 + 1024 * 10);

    let x = DenseTensor::<f32>::zeros(&[100, 784], StorageDevice::Host);
    let y = SparseTensor::from_one_hot(&[0; 100], 10, StorageDevice::Host).unwrap();
    graph
        .feed_forward(
            &params,
            &[mlp.loss, mlp.accuracy],
            &[(FEATURES, ValueRef::Dense(&x)), (LABELS, ValueRef::Sparse(&y))],
        )
        .unwrap();

    // Zero features give zero logits: uniform softmax and an all-ties top-1.
    let loss = graph.as_scalar(mlp.loss).unwrap();
    let accuracy = graph.as_scalar(mlp.accuracy).unwrap();
    assert!(loss.is_finite());
    assert_relative_eq!(loss, 10f32.ln(), epsilon = 1e-5);
    assert!((0.0..=1.0).contains(&accuracy));
    assert_eq!(graph.value(mlp.logits).unwrap().shape(), vec![100, 10]);
}

#[test]
fn test_training_steps_reduce_loss() {
    common::init_logging();
    let (mut params, mut graph, mlp) = mnist_mlp(StorageDevice::Accelerator);
    let mut adam = Adam::new(AdamConfig::with_learning_rate(1e-4)).unwrap();
    let (x, y) = common::random_batch(100, 784, 10, 5);
    let bindings = [(FEATURES, ValueRef::Dense(&x)), (LABELS, ValueRef::Sparse(&y))];

    let mut losses = Vec::new();
    for _ in 0..4 {
        graph
            .feed_forward(&params, &[mlp.loss, mlp.accuracy], &bindings)
            .unwrap();
        let loss = graph.as_scalar(mlp.loss).unwrap();
        assert!(loss.is_finite());
        losses.push(loss);

        graph.back_propagate(&mut params, &[mlp.loss]).unwrap();
        assert_eq!(graph.state(mlp.loss).unwrap(), NodeState::Backpropagated);
        adam.update(&mut params).unwrap();
    }

    assert_eq!(adam.step_count(), 4);
    assert!(losses[3] < losses[0], "losses did not decrease: {:?}", losses);
    assert!(params.iter().all(|p| p.grad().to_vec().iter().all(|&g| g == 0.0)));
}

#[test]
fn test_host_and_accelerator_agree() {
    let (x, y) = common::random_batch(8, 784, 10, 9);
    let mut results = Vec::new();
    for device in [StorageDevice::Host, StorageDevice::Accelerator] {
        let (mut params, mut graph, mlp) = mnist_mlp(device);
        let bindings = [(FEATURES, ValueRef::Dense(&x)), (LABELS, ValueRef::Sparse(&y))];
        graph.feed_forward(&params, &[mlp.loss], &bindings).unwrap();
        graph.back_propagate(&mut params, &[mlp.loss]).unwrap();
        let wo = params.get("wo").unwrap().grad().to_vec();
        results.push((graph.as_scalar(mlp.loss).unwrap(), wo));
    }

    assert_relative_eq!(results[0].0, results[1].0, epsilon = 1e-5);
    for (h, a) in results[0].1.iter().zip(&results[1].1) {
        assert_relative_eq!(*h, *a, epsilon = 1e-5);
    }
}

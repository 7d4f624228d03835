use gnn_core::tensor::{DenseTensor, SparseTensor};
use gnn_core::StorageDevice;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Installs `env_logger` once for the whole test binary.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A host batch of `rows` feature rows drawn uniformly from `[0, 1)` and
/// one-hot labels `i % classes`.
#[allow(dead_code)]
pub fn random_batch(rows: usize, features: usize, classes: usize, seed: u64) -> (DenseTensor<f32>, SparseTensor) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..rows * features).map(|_| rng.gen::<f32>()).collect();
    let x = DenseTensor::from_vec(data, &[rows, features], StorageDevice::Host).expect("batch features");
    let labels: Vec<usize> = (0..rows).map(|i| i % classes).collect();
    let y = SparseTensor::from_one_hot(&labels, classes, StorageDevice::Host).expect("batch labels");
    (x, y)
}

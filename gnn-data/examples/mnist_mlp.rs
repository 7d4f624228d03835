//! Trains a 784-1024-1024-10 ReLU classifier on MNIST.
//!
//! ```text
//! cargo run --release -p gnn-data --example mnist_mlp -- \
//!     -train_feat train-images-idx3-ubyte -train_label train-labels-idx1-ubyte \
//!     -test_feat t10k-images-idx3-ubyte -test_label t10k-labels-idx1-ubyte -device 0
//! ```
//!
//! `-device 0` (or `host`) runs on the host backend, any other value on the
//! accelerator backend. Set `RUST_LOG=info` to see progress.

use std::error::Error;
use std::time::{Duration, Instant};

use gnn_core::model::mlp::{FEATURES, LABELS};
use gnn_core::model::{Mlp, MlpConfig};
use gnn_core::ops::ValueRef;
use gnn_core::optim::{Adam, AdamConfig, GradClipping, Optimizer};
use gnn_core::{FactorGraph, ParamSet, StorageDevice};
use gnn_data::mnist::load_idx;
use gnn_data::{BatchLoader, Dataset, LoaderConfig, RandomSampler, SequentialSampler};

const EPOCHS: usize = 10;
const LEARNING_RATE: f32 = 0.001;

#[derive(Debug, Default)]
struct Args {
    train_feat: Option<String>,
    train_label: Option<String>,
    test_feat: Option<String>,
    test_label: Option<String>,
    device: StorageDevice,
}

fn parse_device(value: &str) -> StorageDevice {
    match value {
        "0" | "host" | "cpu" => StorageDevice::Host,
        _ => StorageDevice::Accelerator,
    }
}

/// Reads `-flag value` pairs; unrecognised flags are skipped.
fn parse_args(argv: &[String]) -> Args {
    let mut args = Args::default();
    for pair in argv.chunks(2) {
        let [flag, value] = pair else { break };
        match flag.as_str() {
            "-train_feat" => args.train_feat = Some(value.clone()),
            "-train_label" => args.train_label = Some(value.clone()),
            "-test_feat" => args.test_feat = Some(value.clone()),
            "-test_label" => args.test_label = Some(value.clone()),
            "-device" => args.device = parse_device(value),
            _ => {}
        }
    }
    args
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, Box<dyn Error>> {
    value.as_deref().ok_or_else(|| format!("missing required flag {}", flag).into())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv);

    let train = load_idx(
        required(&args.train_feat, "-train_feat")?,
        required(&args.train_label, "-train_label")?,
    )?;
    let test = load_idx(
        required(&args.test_feat, "-test_feat")?,
        required(&args.test_label, "-test_label")?,
    )?;
    log::info!("{} images for training", train.len());
    log::info!("{} images for test", test.len());

    let mut params = ParamSet::new(args.device);
    let mut graph = FactorGraph::new(args.device);
    let mlp = Mlp::build(&MlpConfig::default(), &mut params, &mut graph)?;
    let mut optimizer = Adam::new(AdamConfig {
        learning_rate: LEARNING_RATE,
        clipping: GradClipping::default(),
        ..AdamConfig::default()
    })?;
    log::info!(
        "{:?} backend, {} parameters",
        args.device,
        params.total_elements()
    );

    let config = LoaderConfig::default();
    let mut test_loader = BatchLoader::new(&test, SequentialSampler::new(), config)?;
    let mut train_loader = BatchLoader::new(&train, RandomSampler::new(), config)?;
    let targets = [mlp.loss, mlp.accuracy];

    for epoch in 0..EPOCHS {
        let (mut loss, mut err_rate) = (0.0f64, 0.0f64);
        test_loader.start_epoch();
        while let Some((x, y)) = test_loader.next_batch()? {
            let rows = x.rows() as f64;
            graph.feed_forward(&params, &targets, &[(FEATURES, ValueRef::Dense(x)), (LABELS, ValueRef::Sparse(y))])?;
            loss += graph.as_scalar(mlp.loss)? as f64 * rows;
            err_rate += (1.0 - graph.as_scalar(mlp.accuracy)? as f64) * rows;
        }
        let n = test.len().max(1) as f64;
        log::info!(
            "epoch {}: test loss: {:.4}\t error rate: {:.4}",
            epoch,
            loss / n,
            err_rate / n
        );

        let (mut t_ff, mut t_bp, mut t_up) = (Duration::ZERO, Duration::ZERO, Duration::ZERO);
        train_loader.start_epoch();
        while let Some((x, y)) = train_loader.next_batch()? {
            let start = Instant::now();
            graph.feed_forward(&params, &targets, &[(FEATURES, ValueRef::Dense(x)), (LABELS, ValueRef::Sparse(y))])?;
            let forward_done = Instant::now();
            graph.back_propagate(&mut params, &[mlp.loss])?;
            let backward_done = Instant::now();
            optimizer.update(&mut params)?;
            t_ff += forward_done - start;
            t_bp += backward_done - forward_done;
            t_up += backward_done.elapsed();
        }
        log::info!(
            "epoch {}: forward {:.3}s backward {:.3}s update {:.3}s",
            epoch,
            t_ff.as_secs_f64(),
            t_bp.as_secs_f64(),
            t_up.as_secs_f64()
        );
    }
    Ok(())
}

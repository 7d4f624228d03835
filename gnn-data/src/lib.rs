//! Datasets, sampling and batch assembly feeding `gnn-core` graphs.
//!
//! [`mnist::load_idx`] reads IDX image/label files into an
//! [`InMemoryDataset`]; a [`BatchLoader`] walks the dataset in the order of a
//! [`Sampler`] and fills a reusable dense feature tensor and sparse one-hot
//! label tensor per batch.

pub mod batch;
pub mod datasets;
pub mod error;
pub mod mnist;
pub mod samplers;

pub use batch::{BatchLoader, LoaderConfig};
pub use datasets::{Dataset, InMemoryDataset};
pub use error::DataError;
pub use samplers::{RandomSampler, Sampler, SequentialSampler};

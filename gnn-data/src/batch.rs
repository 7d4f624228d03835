//! Mini-batch assembly.
//!
//! A [`BatchLoader`] walks a [`Dataset`] in the order chosen by a [`Sampler`]
//! and copies each mini-batch into a pair of host tensors it owns: a dense
//! `[b, feature_dim]` feature matrix and a sparse `[b, classes]` one-hot label
//! matrix. The tensors are refilled in place, so their allocations are reused
//! from batch to batch.

use gnn_core::{DenseTensor, SparseTensor, StorageDevice};

use crate::datasets::Dataset;
use crate::error::DataError;
use crate::samplers::Sampler;

/// Batching options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Samples per batch.
    pub batch_size: usize,
    /// Skip the last batch of an epoch when it is shorter than `batch_size`.
    pub drop_last: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            batch_size: 100,
            drop_last: false,
        }
    }
}

impl LoaderConfig {
    /// # Errors
    /// Returns `DataError::ConfigurationError` for a zero batch size.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.batch_size == 0 {
            return Err(DataError::ConfigurationError("batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Iterates over a dataset one mini-batch at a time.
///
/// ```
/// use gnn_data::{BatchLoader, InMemoryDataset, LoaderConfig, SequentialSampler};
///
/// let data = InMemoryDataset::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], vec![0, 1, 1], 2, 2).unwrap();
/// let config = LoaderConfig { batch_size: 2, drop_last: false };
/// let mut loader = BatchLoader::new(&data, SequentialSampler::new(), config).unwrap();
///
/// let (x, y) = loader.next_batch().unwrap().unwrap();
/// assert_eq!(x.shape(), &[2, 2]);
/// assert_eq!(y.col_indices().unwrap(), &[0, 1]);
/// let (x, _) = loader.next_batch().unwrap().unwrap();
/// assert_eq!(x.to_vec(), vec![4.0, 5.0]);
/// assert!(loader.next_batch().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct BatchLoader<'a, D: Dataset, S: Sampler> {
    dataset: &'a D,
    sampler: S,
    config: LoaderConfig,
    order: Vec<usize>,
    cursor: usize,
    features: DenseTensor<f32>,
    labels: SparseTensor,
}

impl<'a, D: Dataset, S: Sampler> BatchLoader<'a, D, S> {
    /// Creates a loader positioned at the start of its first epoch.
    ///
    /// # Errors
    /// Returns `DataError::ConfigurationError` if `config` is invalid.
    pub fn new(dataset: &'a D, sampler: S, config: LoaderConfig) -> Result<Self, DataError> {
        config.validate()?;
        let mut loader = BatchLoader {
            dataset,
            sampler,
            config,
            order: Vec::new(),
            cursor: 0,
            features: DenseTensor::new(StorageDevice::Host),
            labels: SparseTensor::new(StorageDevice::Host),
        };
        loader.start_epoch();
        Ok(loader)
    }

    /// Draws a new visiting order from the sampler and rewinds.
    pub fn start_epoch(&mut self) {
        self.order = self.sampler.iter(self.dataset.len()).collect();
        self.cursor = 0;
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of batches one epoch yields.
    pub fn num_batches(&self) -> usize {
        let n = self.sampler.len(self.dataset.len());
        if self.config.drop_last {
            n / self.config.batch_size
        } else {
            (n + self.config.batch_size - 1) / self.config.batch_size
        }
    }

    /// Fills and returns the next batch, or `None` once the epoch is exhausted.
    ///
    /// # Errors
    /// - `DataError::IndexOutOfBounds` if the sampler yields an index outside
    ///   the dataset.
    /// - `DataError::Format` if a sample's features or label do not match the
    ///   dataset's declared dimensions.
    pub fn next_batch(&mut self) -> Result<Option<(&DenseTensor<f32>, &SparseTensor)>, DataError> {
        let remaining = self.order.len() - self.cursor;
        let b = remaining.min(self.config.batch_size);
        if b == 0 || (self.config.drop_last && b < self.config.batch_size) {
            return Ok(None);
        }
        let indices = &self.order[self.cursor..self.cursor + b];
        let dim = self.dataset.feature_dim();
        let classes = self.dataset.classes();

        self.features.resize(&[b, dim])?;
        let rows = self.features.host_data_mut()?;
        for (row, &index) in rows.chunks_exact_mut(dim.max(1)).zip(indices) {
            let sample = self.dataset.features(index)?;
            if sample.len() != dim {
                return Err(DataError::Format(format!(
                    "sample {} has {} features, expected {}",
                    index,
                    sample.len(),
                    dim
                )));
            }
            row.copy_from_slice(sample);
        }

        self.labels.reshape(b, classes);
        self.labels.resize_nnz(b);
        for (i, offset) in self.labels.row_offsets_mut()?.iter_mut().enumerate() {
            *offset = i;
        }
        let cols = self.labels.col_indices_mut()?;
        for (col, &index) in cols.iter_mut().zip(indices) {
            let label = self.dataset.label(index)?;
            if label >= classes {
                return Err(DataError::Format(format!(
                    "label {} of sample {} is out of range for {} classes",
                    label, index, classes
                )));
            }
            *col = label;
        }
        self.labels.values_mut()?.fill(1.0);

        self.cursor += b;
        log::trace!("next_batch: {} samples, {} left in epoch", b, self.order.len() - self.cursor);
        Ok(Some((&self.features, &self.labels)))
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;

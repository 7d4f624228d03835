use std::fmt::Debug;

/// Defines the order in which a `BatchLoader` visits the samples of a dataset.
pub trait Sampler: Debug + Send + Sync {
    /// Returns the sample indices of one epoch over a dataset of
    /// `dataset_len` samples.
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync>;

    /// Number of indices `iter` yields for a dataset of `dataset_len` samples.
    fn len(&self, dataset_len: usize) -> usize {
        dataset_len
    }
}

use super::traits::Dataset;
use crate::error::DataError;

/// A dataset held entirely in memory as one flat row-major feature buffer and
/// a label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryDataset {
    features: Vec<f32>,
    labels: Vec<usize>,
    feature_dim: usize,
    classes: usize,
}

impl InMemoryDataset {
    /// Creates a dataset of `labels.len()` samples.
    ///
    /// # Errors
    /// Returns `DataError::Format` if `features` does not hold exactly
    /// `labels.len() * feature_dim` values or a label is not below `classes`.
    pub fn new(features: Vec<f32>, labels: Vec<usize>, feature_dim: usize, classes: usize) -> Result<Self, DataError> {
        if features.len() != labels.len() * feature_dim {
            return Err(DataError::Format(format!(
                "{} feature values for {} samples of dimension {}",
                features.len(),
                labels.len(),
                feature_dim
            )));
        }
        if let Some((i, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= classes) {
            return Err(DataError::Format(format!(
                "label {} of sample {} is out of range for {} classes",
                label, i, classes
            )));
        }
        Ok(InMemoryDataset {
            features,
            labels,
            feature_dim,
            classes,
        })
    }

    /// All labels in sample order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    fn check(&self, index: usize) -> Result<(), DataError> {
        if index >= self.labels.len() {
            return Err(DataError::IndexOutOfBounds {
                index,
                len: self.labels.len(),
            });
        }
        Ok(())
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    fn classes(&self) -> usize {
        self.classes
    }

    fn features(&self, index: usize) -> Result<&[f32], DataError> {
        self.check(index)?;
        let start = index * self.feature_dim;
        Ok(&self.features[start..start + self.feature_dim])
    }

    fn label(&self, index: usize) -> Result<usize, DataError> {
        self.check(index)?;
        Ok(self.labels[index])
    }
}

#[cfg(test)]
#[path = "in_memory_test.rs"]
mod tests;

use crate::error::DataError;

/// Trait representing a labelled classification dataset.
///
/// Every sample is a fixed-length row of `f32` features and a class index in
/// `0..classes()`.
pub trait Dataset {
    /// Total number of samples.
    fn len(&self) -> usize;

    /// Returns true if the dataset contains no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of every feature row.
    fn feature_dim(&self) -> usize;

    /// Number of classes.
    fn classes(&self) -> usize;

    /// Feature row of sample `index`.
    ///
    /// # Errors
    /// Returns `DataError::IndexOutOfBounds` if `index >= len()`.
    fn features(&self, index: usize) -> Result<&[f32], DataError>;

    /// Class of sample `index`.
    ///
    /// # Errors
    /// Returns `DataError::IndexOutOfBounds` if `index >= len()`.
    fn label(&self, index: usize) -> Result<usize, DataError>;
}

use crate::device::{ensure_device, StorageDevice};
use crate::error::GnnError;
use crate::tensor::DenseTensor;

/// A 2-D `f32` matrix in compressed-row (CSR) form.
///
/// `row_offsets` has `rows + 1` entries; the stored entries of row `i` are
/// `col_indices[row_offsets[i]..row_offsets[i + 1]]` with the matching
/// `values`. Column indices inside a row need not be sorted.
///
/// Population protocol: [`reshape`] the matrix, [`resize_nnz`] the compressed
/// arrays, fill them through the `*_mut` accessors, and establish the
/// invariant checked by [`validate`] before any operator reads the tensor.
///
/// [`reshape`]: SparseTensor::reshape
/// [`resize_nnz`]: SparseTensor::resize_nnz
/// [`validate`]: SparseTensor::validate
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTensor {
    rows: usize,
    cols: usize,
    device: StorageDevice,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f32>,
}

/// Borrowed compressed-row arrays handed to kernels.
#[derive(Debug, Clone, Copy)]
pub struct CsrView<'a> {
    pub rows: usize,
    pub cols: usize,
    pub row_offsets: &'a [usize],
    pub col_indices: &'a [usize],
    pub values: &'a [f32],
}

impl<'a> CsrView<'a> {
    /// Iterates the `(column, value)` entries stored for row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + 'a {
        let start = self.row_offsets[i];
        let end = self.row_offsets[i + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }
}

impl SparseTensor {
    /// Creates an empty `0 x 0` matrix on `device`.
    pub fn new(device: StorageDevice) -> Self {
        SparseTensor {
            rows: 0,
            cols: 0,
            device,
            row_offsets: vec![0],
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a matrix from compressed-row arrays, validating them.
    ///
    /// # Errors
    /// Returns `GnnError::InvalidSparse` if the arrays break the invariant.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f32>,
        device: StorageDevice,
    ) -> Result<Self, GnnError> {
        let tensor = SparseTensor {
            rows,
            cols,
            device,
            row_offsets,
            col_indices,
            values,
        };
        tensor.validate()?;
        Ok(tensor)
    }

    /// One-hot encodes `labels` into a `labels.len() x classes` matrix.
    ///
    /// # Errors
    /// Returns `GnnError::InvalidSparse` if a label is `>= classes`.
    pub fn from_one_hot(labels: &[usize], classes: usize, device: StorageDevice) -> Result<Self, GnnError> {
        let rows = labels.len();
        SparseTensor::from_csr(
            rows,
            classes,
            (0..=rows).collect(),
            labels.to_vec(),
            vec![1.0; rows],
            device,
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `[rows, cols]`
    pub fn shape(&self) -> Vec<usize> {
        vec![self.rows, self.cols]
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sets the logical dimensions; `row_offsets` is resized to `rows + 1`.
    pub fn reshape(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.row_offsets.resize(rows + 1, 0);
    }

    /// Pre-sizes the column-index and value arrays to `capacity` entries.
    pub fn resize_nnz(&mut self, capacity: usize) {
        self.col_indices.resize(capacity, 0);
        self.values.resize(capacity, 0.0);
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn row_offsets(&self) -> Result<&[usize], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "row_offsets")?;
        Ok(&self.row_offsets)
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn col_indices(&self) -> Result<&[usize], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "col_indices")?;
        Ok(&self.col_indices)
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn values(&self) -> Result<&[f32], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "values")?;
        Ok(&self.values)
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn row_offsets_mut(&mut self) -> Result<&mut [usize], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "row_offsets_mut")?;
        Ok(&mut self.row_offsets)
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn col_indices_mut(&mut self) -> Result<&mut [usize], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "col_indices_mut")?;
        Ok(&mut self.col_indices)
    }

    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn values_mut(&mut self) -> Result<&mut [f32], GnnError> {
        ensure_device(StorageDevice::Host, self.device, "values_mut")?;
        Ok(&mut self.values)
    }

    /// Checks the compressed-row invariant.
    ///
    /// # Errors
    /// Returns `GnnError::InvalidSparse` describing the first violation found.
    pub fn validate(&self) -> Result<(), GnnError> {
        if self.row_offsets.len() != self.rows + 1 {
            return Err(GnnError::InvalidSparse(format!(
                "row_offsets has {} entries, expected rows + 1 = {}",
                self.row_offsets.len(),
                self.rows + 1
            )));
        }
        if self.col_indices.len() != self.values.len() {
            return Err(GnnError::InvalidSparse(format!(
                "{} column indices but {} values",
                self.col_indices.len(),
                self.values.len()
            )));
        }
        if self.row_offsets[0] != 0 {
            return Err(GnnError::InvalidSparse(format!(
                "row_offsets[0] = {}, expected 0",
                self.row_offsets[0]
            )));
        }
        if self.row_offsets[self.rows] != self.nnz() {
            return Err(GnnError::InvalidSparse(format!(
                "row_offsets[{}] = {}, expected nnz = {}",
                self.rows,
                self.row_offsets[self.rows],
                self.nnz()
            )));
        }
        if let Some(i) = self.row_offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(GnnError::InvalidSparse(format!(
                "row_offsets decreases between rows {} and {}",
                i,
                i + 1
            )));
        }
        if let Some(&col) = self.col_indices.iter().find(|&&c| c >= self.cols) {
            return Err(GnnError::InvalidSparse(format!(
                "column index {} out of range for {} columns",
                col, self.cols
            )));
        }
        Ok(())
    }

    /// Copies `src` into this tensor, transferring between devices as needed.
    /// The destination adopts the source dimensions.
    pub fn copy_from(&mut self, src: &SparseTensor) {
        if self.device != src.device {
            log::trace!(
                "copy_from: transferring sparse {}x{} ({} nnz) {:?} -> {:?}",
                src.rows,
                src.cols,
                src.nnz(),
                src.device,
                self.device
            );
        }
        self.rows = src.rows;
        self.cols = src.cols;
        self.row_offsets.clear();
        self.row_offsets.extend_from_slice(&src.row_offsets);
        self.col_indices.clear();
        self.col_indices.extend_from_slice(&src.col_indices);
        self.values.clear();
        self.values.extend_from_slice(&src.values);
    }

    /// Expands to a dense `rows x cols` tensor on the same device.
    ///
    /// # Errors
    /// Returns `GnnError::InvalidSparse` if the invariant does not hold.
    pub fn to_dense(&self) -> Result<DenseTensor<f32>, GnnError> {
        self.validate()?;
        let mut dense = DenseTensor::zeros(&[self.rows, self.cols], self.device);
        let csr = self.csr();
        let out = dense.storage_mut();
        for i in 0..self.rows {
            for (col, value) in csr.row(i) {
                out[i * self.cols + col] += value;
            }
        }
        Ok(dense)
    }

    /// Kernel-side view of the compressed arrays, bypassing the host check.
    pub(crate) fn csr(&self) -> CsrView<'_> {
        CsrView {
            rows: self.rows,
            cols: self.cols,
            row_offsets: &self.row_offsets,
            col_indices: &self.col_indices,
            values: &self.values,
        }
    }
}

#[cfg(test)]
#[path = "sparse_test.rs"]
mod tests;

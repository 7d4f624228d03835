use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::buffer::Buffer;
use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::tensor::utils::{numel, split_rows_cols};
use crate::types::{DType, Element};

/// A dense, row-major, device-tagged tensor.
///
/// The element count always equals the product of the shape dimensions.
/// Storage is exclusive to the tensor unless it was produced by [`view`],
/// in which case both handles alias one buffer until either of them writes.
///
/// Host code reads and writes the elements through [`host_data`] and
/// [`host_data_mut`], which refuse accelerator-resident tensors: moving data
/// across devices always goes through [`copy_from`].
///
/// [`view`]: DenseTensor::view
/// [`host_data`]: DenseTensor::host_data
/// [`host_data_mut`]: DenseTensor::host_data_mut
/// [`copy_from`]: DenseTensor::copy_from
#[derive(Debug, Clone)]
pub struct DenseTensor<T: Element> {
    shape: Vec<usize>,
    device: StorageDevice,
    buffer: Buffer<T>,
    /// Views have a fixed element count.
    is_view: bool,
}

impl<T: Element> DenseTensor<T> {
    /// Creates an empty tensor (shape `[0]`) on `device`.
    pub fn new(device: StorageDevice) -> Self {
        DenseTensor {
            shape: vec![0],
            device,
            buffer: Buffer::default(),
            is_view: false,
        }
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(shape: &[usize], device: StorageDevice) -> Self {
        DenseTensor {
            shape: shape.to_vec(),
            device,
            buffer: Buffer::zeros(numel(shape)),
            is_view: false,
        }
    }

    /// Creates a tensor from row-major data.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` if `data.len()` does not match the element
    /// count of `shape`.
    pub fn from_vec(data: Vec<T>, shape: &[usize], device: StorageDevice) -> Result<Self, GnnError> {
        let expected = numel(shape);
        if data.len() != expected {
            return Err(GnnError::shape(&[expected], &[data.len()], "DenseTensor::from_vec"));
        }
        Ok(DenseTensor {
            shape: shape.to_vec(),
            device,
            buffer: Buffer::from_vec(data),
            is_view: false,
        })
    }

    /// Creates a one-element tensor of shape `[1]`.
    pub fn scalar(value: T, device: StorageDevice) -> Self {
        DenseTensor {
            shape: vec![1],
            device,
            buffer: Buffer::from_vec(vec![value]),
            is_view: false,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of the leading dimension (1 for a rank-0 tensor).
    pub fn rows(&self) -> usize {
        split_rows_cols(&self.shape).0
    }

    /// Product of all dimensions after the leading one.
    pub fn cols(&self) -> usize {
        split_rows_cols(&self.shape).1
    }

    /// Whether this tensor is a fixed-shape view created by [`DenseTensor::view`].
    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// Reinterprets the storage with a new shape of the same element count.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` if the element counts differ.
    pub fn reshape(&mut self, dims: &[usize]) -> Result<(), GnnError> {
        if numel(dims) != self.numel() {
            return Err(GnnError::shape(&self.shape, dims, "reshape"));
        }
        self.shape = dims.to_vec();
        Ok(())
    }

    /// Reallocates to a new shape with a possibly different element count.
    ///
    /// The leading elements are kept, new elements are zero, and the existing
    /// allocation is reused whenever it is large enough.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` for a view whose element count would change.
    pub fn resize(&mut self, dims: &[usize]) -> Result<(), GnnError> {
        let count = numel(dims);
        if self.is_view && count != self.numel() {
            return Err(GnnError::shape(&self.shape, dims, "resize (fixed-shape view)"));
        }
        self.buffer.resize(count);
        self.shape = dims.to_vec();
        Ok(())
    }

    /// Returns a zero-copy view of the same storage with another shape.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` if the element counts differ.
    pub fn view(&self, dims: &[usize]) -> Result<Self, GnnError> {
        if numel(dims) != self.numel() {
            return Err(GnnError::shape(&self.shape, dims, "view"));
        }
        Ok(DenseTensor {
            shape: dims.to_vec(),
            device: self.device,
            buffer: self.buffer.share(),
            is_view: true,
        })
    }

    /// Copies `src` into this tensor, transferring between devices as needed.
    ///
    /// The destination keeps its own device and adopts the source shape,
    /// overwriting its allocation in place when it is large enough.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` if this tensor is a view whose shape differs
    /// from `src`.
    pub fn copy_from(&mut self, src: &DenseTensor<T>) -> Result<(), GnnError> {
        if self.is_view && self.shape != src.shape {
            return Err(GnnError::shape(&self.shape, &src.shape, "copy_from (fixed-shape view)"));
        }
        if self.device != src.device {
            log::trace!(
                "copy_from: transferring {} elements {:?} -> {:?}",
                src.numel(),
                src.device,
                self.device
            );
        }
        let dst = self.buffer.prepare_overwrite(src.numel());
        dst.copy_from_slice(src.buffer.as_slice());
        self.shape = src.shape.clone();
        Ok(())
    }

    /// Returns a copy of this tensor living on `device`.
    pub fn to_device(&self, device: StorageDevice) -> Self {
        let mut out = DenseTensor::new(device);
        out.shape = self.shape.clone();
        out.buffer = Buffer::from_vec(self.buffer.as_slice().to_vec());
        out
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.buffer.as_mut_slice().fill(value);
    }

    /// Sets every element to zero.
    pub fn zero(&mut self) {
        self.fill(T::zero());
    }

    /// Host-side read access.
    ///
    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn host_data(&self) -> Result<&[T], GnnError> {
        crate::device::ensure_device(StorageDevice::Host, self.device, "host_data")?;
        Ok(self.buffer.as_slice())
    }

    /// Host-side write access.
    ///
    /// # Errors
    /// Returns `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn host_data_mut(&mut self) -> Result<&mut [T], GnnError> {
        crate::device::ensure_device(StorageDevice::Host, self.device, "host_data_mut")?;
        Ok(self.buffer.as_mut_slice())
    }

    /// Reads one element by flat index (host tensors only).
    ///
    /// # Errors
    /// `GnnError::Shape` when `index` lies past the allocated elements,
    /// `GnnError::DeviceMismatch` for accelerator-resident tensors.
    pub fn get(&self, index: usize) -> Result<T, GnnError> {
        let data = self.host_data()?;
        data.get(index)
            .copied()
            .ok_or_else(|| GnnError::shape(&[data.len()], &[index + 1], "get"))
    }

    /// Writes one element by flat index (host tensors only).
    ///
    /// # Errors
    /// Same conditions as [`DenseTensor::get`].
    pub fn set(&mut self, index: usize, value: T) -> Result<(), GnnError> {
        let data = self.host_data_mut()?;
        let len = data.len();
        let slot = data
            .get_mut(index)
            .ok_or_else(|| GnnError::shape(&[len], &[index + 1], "set"))?;
        *slot = value;
        Ok(())
    }

    /// Copies the elements to a host vector, whatever the device.
    pub fn to_vec(&self) -> Vec<T> {
        if self.device != StorageDevice::Host {
            log::trace!("to_vec: reading {} elements back from {:?}", self.numel(), self.device);
        }
        self.buffer.as_slice().to_vec()
    }

    /// Returns the single element of a one-element tensor, whatever the device.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` unless the tensor has exactly one element.
    pub fn as_scalar(&self) -> Result<T, GnnError> {
        if self.numel() != 1 {
            return Err(GnnError::shape(&[1], &self.shape, "as_scalar"));
        }
        Ok(self.buffer.as_slice()[0])
    }

    /// Kernel-side access, bypassing the host check.
    pub(crate) fn storage(&self) -> &[T] {
        self.buffer.as_slice()
    }

    /// Kernel-side mutable access, bypassing the host check.
    pub(crate) fn storage_mut(&mut self) -> &mut [T] {
        self.buffer.as_mut_slice()
    }

    /// Reshapes to `dims` for an upcoming full overwrite by a kernel.
    pub(crate) fn prepare_output(&mut self, dims: &[usize]) -> &mut [T] {
        self.is_view = false;
        self.shape = dims.to_vec();
        self.buffer.prepare_overwrite(numel(dims))
    }
}

impl DenseTensor<f32> {
    /// Fills every element independently from `N(mean, std^2)`.
    ///
    /// Intended for trainable-variable initialization only.
    ///
    /// # Errors
    /// Returns `GnnError::ConfigurationError` if `std` is negative or not finite.
    pub fn fill_random_normal<R: Rng + ?Sized>(
        &mut self,
        mean: f32,
        std: f32,
        rng: &mut R,
    ) -> Result<(), GnnError> {
        let normal = Normal::new(mean, std).map_err(|e| {
            GnnError::ConfigurationError(format!("invalid normal distribution N({}, {}): {}", mean, std, e))
        })?;
        for v in self.buffer.as_mut_slice() {
            *v = normal.sample(rng);
        }
        Ok(())
    }
}

impl<T: Element> PartialEq for DenseTensor<T> {
    /// Two tensors are equal when device, shape and elements match.
    fn eq(&self, other: &Self) -> bool {
        self.device == other.device
            && self.shape == other.shape
            && self.buffer.as_slice() == other.buffer.as_slice()
    }
}

#[cfg(test)]
#[path = "dense_test.rs"]
mod tests;

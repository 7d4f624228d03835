use std::sync::Arc;

use crate::types::Element;

/// Flat element storage backing a dense tensor.
///
/// The vector sits behind an `Arc` so that an explicit zero-copy view can share
/// it. A tensor that owns its buffer exclusively mutates it in place; a shared
/// buffer is detached (copied) on first write, so views never observe writes
/// made through another handle.
#[derive(Debug, Clone)]
pub struct Buffer<T: Element> {
    data: Arc<Vec<T>>,
}

impl<T: Element> Buffer<T> {
    /// Allocates `len` zero-initialized elements.
    pub fn zeros(len: usize) -> Self {
        Buffer {
            data: Arc::new(vec![T::zero(); len]),
        }
    }

    /// Takes ownership of an existing vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        Buffer {
            data: Arc::new(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` when another tensor (a view) shares this storage.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.data) > 1
    }

    /// A second handle on the same storage (used by views).
    pub(crate) fn share(&self) -> Self {
        Buffer {
            data: Arc::clone(&self.data),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Mutable access, detaching the storage first if it is shared.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Resizes to `len` elements. The existing prefix is kept and new elements
    /// are zeroed; the allocation is reused when the capacity suffices.
    pub fn resize(&mut self, len: usize) {
        if self.data.len() == len {
            return;
        }
        Arc::make_mut(&mut self.data).resize(len, T::zero());
    }

    /// Prepares the buffer to be fully overwritten with `len` elements.
    ///
    /// Unlike `resize`, a shared buffer is replaced by a fresh allocation
    /// instead of being copied. Contents are unspecified afterwards.
    pub(crate) fn prepare_overwrite(&mut self, len: usize) -> &mut [T] {
        if self.is_shared() {
            self.data = Arc::new(vec![T::zero(); len]);
        } else {
            Arc::make_mut(&mut self.data).resize(len, T::zero());
        }
        self.as_mut_slice()
    }
}

impl<T: Element> Default for Buffer<T> {
    fn default() -> Self {
        Buffer::zeros(0)
    }
}

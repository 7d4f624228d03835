use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::tensor::{DenseTensor, SparseTensor};
use crate::types::ValueKind;

/// Partially known shape of a node value.
///
/// `None` entries are dynamic dimensions (typically the batch size) that are
/// only fixed when a value is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeHint {
    /// Nothing is known, not even the rank.
    Unknown,
    Dims(Vec<Option<usize>>),
}

impl ShapeHint {
    /// A fully known shape.
    pub fn known(dims: &[usize]) -> Self {
        ShapeHint::Dims(dims.iter().map(|&d| Some(d)).collect())
    }

    pub fn rank(&self) -> Option<usize> {
        match self {
            ShapeHint::Unknown => None,
            ShapeHint::Dims(dims) => Some(dims.len()),
        }
    }

    /// Whether a concrete shape is compatible with this hint.
    pub fn matches(&self, actual: &[usize]) -> bool {
        match self {
            ShapeHint::Unknown => true,
            ShapeHint::Dims(dims) => {
                dims.len() == actual.len()
                    && dims
                        .iter()
                        .zip(actual)
                        .all(|(hint, &a)| hint.map_or(true, |d| d == a))
            }
        }
    }

    /// The hint's dimensions for a rank-`rank` value; all dynamic if unknown.
    ///
    /// # Errors
    /// Returns `GnnError::Shape` if the hint has a different rank.
    pub fn dims_of_rank(&self, rank: usize, operation: &str) -> Result<Vec<Option<usize>>, GnnError> {
        match self {
            ShapeHint::Unknown => Ok(vec![None; rank]),
            ShapeHint::Dims(dims) if dims.len() == rank => Ok(dims.clone()),
            ShapeHint::Dims(_) => Err(GnnError::Shape {
                expected: vec![0; rank],
                actual: self.display_dims(),
                operation: format!("{} (expected rank {})", operation, rank),
            }),
        }
    }

    /// Dimensions for error reports; dynamic dimensions are shown as 0.
    pub fn display_dims(&self) -> Vec<usize> {
        match self {
            ShapeHint::Unknown => Vec::new(),
            ShapeHint::Dims(dims) => dims.iter().map(|d| d.unwrap_or(0)).collect(),
        }
    }
}

/// Merges two views of the same dimension, failing if both are known and differ.
pub(crate) fn unify_dim(a: Option<usize>, b: Option<usize>) -> Result<Option<usize>, (usize, usize)> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => Err((x, y)),
        (Some(x), _) => Ok(Some(x)),
        (None, y) => Ok(y),
    }
}

/// Static description of a node value: kind plus partially known shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub kind: ValueKind,
    pub shape: ShapeHint,
}

impl TensorSpec {
    pub fn new(kind: ValueKind, shape: ShapeHint) -> Self {
        TensorSpec { kind, shape }
    }

    pub fn dense(dims: Vec<Option<usize>>) -> Self {
        TensorSpec::new(ValueKind::Dense, ShapeHint::Dims(dims))
    }

    pub fn int(dims: Vec<Option<usize>>) -> Self {
        TensorSpec::new(ValueKind::Int, ShapeHint::Dims(dims))
    }

    /// Fails with `DataTypeMismatch` unless this spec has `kind`.
    pub fn expect_kind(&self, kind: ValueKind, operation: &str) -> Result<(), GnnError> {
        if self.kind != kind {
            return Err(GnnError::DataTypeMismatch {
                expected: kind,
                actual: self.kind,
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

/// Borrowed node value handed to operators and accepted as a binding.
#[derive(Debug, Clone, Copy)]
pub enum ValueRef<'a> {
    Dense(&'a DenseTensor<f32>),
    Int(&'a DenseTensor<i32>),
    Sparse(&'a SparseTensor),
}

impl<'a> ValueRef<'a> {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRef::Dense(_) => ValueKind::Dense,
            ValueRef::Int(_) => ValueKind::Int,
            ValueRef::Sparse(_) => ValueKind::Sparse,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            ValueRef::Dense(t) => t.shape().to_vec(),
            ValueRef::Int(t) => t.shape().to_vec(),
            ValueRef::Sparse(t) => t.shape(),
        }
    }

    pub fn device(&self) -> StorageDevice {
        match self {
            ValueRef::Dense(t) => t.device(),
            ValueRef::Int(t) => t.device(),
            ValueRef::Sparse(t) => t.device(),
        }
    }

    fn mismatch(&self, expected: ValueKind, operation: &str) -> GnnError {
        GnnError::DataTypeMismatch {
            expected,
            actual: self.kind(),
            operation: operation.to_string(),
        }
    }

    /// # Errors
    /// Returns `GnnError::DataTypeMismatch` for non-dense values.
    pub fn as_dense(&self, operation: &str) -> Result<&'a DenseTensor<f32>, GnnError> {
        match *self {
            ValueRef::Dense(t) => Ok(t),
            _ => Err(self.mismatch(ValueKind::Dense, operation)),
        }
    }

    /// # Errors
    /// Returns `GnnError::DataTypeMismatch` for non-integer values.
    pub fn as_int(&self, operation: &str) -> Result<&'a DenseTensor<i32>, GnnError> {
        match *self {
            ValueRef::Int(t) => Ok(t),
            _ => Err(self.mismatch(ValueKind::Int, operation)),
        }
    }

    /// # Errors
    /// Returns `GnnError::DataTypeMismatch` for non-sparse values.
    pub fn as_sparse(&self, operation: &str) -> Result<&'a SparseTensor, GnnError> {
        match *self {
            ValueRef::Sparse(t) => Ok(t),
            _ => Err(self.mismatch(ValueKind::Sparse, operation)),
        }
    }
}

impl<'a> From<&'a DenseTensor<f32>> for ValueRef<'a> {
    fn from(t: &'a DenseTensor<f32>) -> Self {
        ValueRef::Dense(t)
    }
}

impl<'a> From<&'a DenseTensor<i32>> for ValueRef<'a> {
    fn from(t: &'a DenseTensor<i32>) -> Self {
        ValueRef::Int(t)
    }
}

impl<'a> From<&'a SparseTensor> for ValueRef<'a> {
    fn from(t: &'a SparseTensor) -> Self {
        ValueRef::Sparse(t)
    }
}

/// Owned node value: the forward output buffer of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Dense(DenseTensor<f32>),
    Int(DenseTensor<i32>),
    Sparse(SparseTensor),
}

impl NodeValue {
    /// An empty buffer of `kind` on `device`.
    pub fn empty(kind: ValueKind, device: StorageDevice) -> Self {
        match kind {
            ValueKind::Dense => NodeValue::Dense(DenseTensor::new(device)),
            ValueKind::Int => NodeValue::Int(DenseTensor::new(device)),
            ValueKind::Sparse => NodeValue::Sparse(SparseTensor::new(device)),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.as_ref().kind()
    }

    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            NodeValue::Dense(t) => ValueRef::Dense(t),
            NodeValue::Int(t) => ValueRef::Int(t),
            NodeValue::Sparse(t) => ValueRef::Sparse(t),
        }
    }

    /// # Errors
    /// Returns `GnnError::DataTypeMismatch` for non-dense buffers.
    pub fn dense_mut(&mut self, operation: &str) -> Result<&mut DenseTensor<f32>, GnnError> {
        let actual = self.kind();
        match self {
            NodeValue::Dense(t) => Ok(t),
            _ => Err(GnnError::DataTypeMismatch {
                expected: ValueKind::Dense,
                actual,
                operation: operation.to_string(),
            }),
        }
    }

    /// # Errors
    /// Returns `GnnError::DataTypeMismatch` for non-integer buffers.
    pub fn int_mut(&mut self, operation: &str) -> Result<&mut DenseTensor<i32>, GnnError> {
        let actual = self.kind();
        match self {
            NodeValue::Int(t) => Ok(t),
            _ => Err(GnnError::DataTypeMismatch {
                expected: ValueKind::Int,
                actual,
                operation: operation.to_string(),
            }),
        }
    }

    /// Overwrites this buffer with `src`, transferring to this buffer's device.
    ///
    /// # Errors
    /// `GnnError::DataTypeMismatch` if the kinds differ, plus any error of the
    /// underlying `copy_from`.
    pub fn copy_from(&mut self, src: ValueRef<'_>) -> Result<(), GnnError> {
        match (self, src) {
            (NodeValue::Dense(dst), ValueRef::Dense(s)) => dst.copy_from(s),
            (NodeValue::Int(dst), ValueRef::Int(s)) => dst.copy_from(s),
            (NodeValue::Sparse(dst), ValueRef::Sparse(s)) => {
                dst.copy_from(s);
                Ok(())
            }
            (dst, src) => Err(GnnError::DataTypeMismatch {
                expected: dst.kind(),
                actual: src.kind(),
                operation: "copy_from".to_string(),
            }),
        }
    }
}

use num_traits::Zero;
use std::fmt::Debug;

/// Defines the possible data types for tensor elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating-point type (values, gradients, losses).
    F32,
    /// 32-bit integer type (class indices, indicators).
    I32,
}

/// Element types a `DenseTensor` can hold.
///
/// The bounds cover what the kernels need: zero-initialization and
/// thread-safety for the data-parallel accelerator backend.
pub trait Element: Copy + Debug + PartialEq + PartialOrd + Zero + Send + Sync + 'static {
    /// The runtime tag of this element type.
    const DTYPE: DType;
}

/// The kind of value a graph node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Dense `f32` tensor (activations, losses, gradients).
    Dense,
    /// Dense `i32` tensor (class indices, 0/1 indicators).
    Int,
    /// Compressed-row `f32` matrix (one-hot labels).
    Sparse,
}

impl ValueKind {
    /// Element type of the stored values.
    pub fn dtype(self) -> DType {
        match self {
            ValueKind::Dense | ValueKind::Sparse => DType::F32,
            ValueKind::Int => DType::I32,
        }
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

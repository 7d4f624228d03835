use crate::device::StorageDevice;
use crate::types::ValueKind;
use thiserror::Error;

/// Custom error type for the gnn engine.
///
/// Every error is raised synchronously at the point of misuse and terminates
/// the current call; nothing is retried or silently recovered.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GnnError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Device mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: StorageDevice,
        actual: StorageDevice,
        operation: String,
    },

    #[error("Value kind mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DataTypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
        operation: String,
    },

    #[error("Operator '{operator}' depends on node {node} which is not registered in this graph")]
    Dependency { operator: String, node: String },

    #[error("No placeholder named '{name}' is registered in the graph")]
    UnknownPlaceholder { name: String },

    #[error("Placeholder '{name}' is required by the evaluation but has never been bound")]
    UnboundPlaceholder { name: String },

    #[error("Constant '{name}' is not an input and has already been bound")]
    ImmutableConstant { name: String },

    #[error("Name '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Node '{node}' has not been evaluated: {reason}")]
    NotEvaluated { node: String, reason: String },

    #[error("Sparse tensor violates the compressed-row invariant: {0}")]
    InvalidSparse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GnnError {
    /// Shorthand for a `Shape` error.
    pub(crate) fn shape(expected: &[usize], actual: &[usize], operation: &str) -> Self {
        GnnError::Shape {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
            operation: operation.to_string(),
        }
    }
}

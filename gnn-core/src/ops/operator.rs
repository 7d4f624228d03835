use std::fmt::Debug;

use crate::device::{ensure_device, StorageDevice};
use crate::error::GnnError;
use crate::ops::value::{NodeValue, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;

/// A differentiable (or purely forward) computation registered in a graph.
///
/// Implementations are stateless with respect to a particular evaluation: the
/// graph owns every output and gradient buffer and hands them to the operator
/// on each call, so one operator type can back any number of nodes. The trait
/// is public; operators defined outside this crate plug into the graph without
/// any change to the executor.
///
/// The `Debug + Send + Sync` bounds match the other trait objects of the crate
/// (`Device`) so a graph can be moved across threads.
pub trait Operator: Debug + Send + Sync {
    /// Short name used in node names, logs and error reports.
    fn name(&self) -> &str;

    /// Computes the output spec from the input specs at construction time.
    ///
    /// # Errors
    /// `GnnError::DataTypeMismatch` for an input of the wrong value kind,
    /// `GnnError::Shape` for known dimensions that cannot agree, or
    /// `GnnError::Dependency` for a wrong number of inputs.
    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError>;

    /// Computes the output from `inputs` into `output`.
    ///
    /// `output` already has the kind returned by [`Operator::infer`] and is
    /// reshaped by the operator as needed. `device` is the graph's device;
    /// every input lives on it.
    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError>;

    /// Propagates `grad_output` (dL/dOutput) to the inputs.
    ///
    /// Contributions must be *added* into the buffers obtained from `grads`;
    /// several consumers of one node each add their share.
    fn backward(
        &self,
        inputs: &[ValueRef<'_>],
        output: &NodeValue,
        grad_output: &DenseTensor<f32>,
        grads: &mut GradSink<'_>,
    ) -> Result<(), GnnError> {
        let _ = (inputs, output, grad_output, grads);
        Err(GnnError::InternalError(format!(
            "operator '{}' has no backward rule",
            self.name()
        )))
    }

    /// Whether gradients flow through this operator. Outputs of
    /// non-differentiable operators never carry a gradient.
    fn is_differentiable(&self) -> bool {
        true
    }
}

/// Input-gradient buffers of one operator node during backpropagation.
///
/// A buffer is zero-initialized (with the input's shape) on first access in a
/// pass and only handed out for inputs that require a gradient.
#[derive(Debug)]
pub struct GradSink<'a> {
    device: StorageDevice,
    grads: &'a mut [DenseTensor<f32>],
    touched: &'a mut [bool],
    nodes: &'a [usize],
    wants: Vec<bool>,
    shapes: Vec<Vec<usize>>,
}

impl<'a> GradSink<'a> {
    pub(crate) fn new(
        device: StorageDevice,
        grads: &'a mut [DenseTensor<f32>],
        touched: &'a mut [bool],
        nodes: &'a [usize],
        wants: Vec<bool>,
        shapes: Vec<Vec<usize>>,
    ) -> Self {
        GradSink {
            device,
            grads,
            touched,
            nodes,
            wants,
            shapes,
        }
    }

    /// Whether input `input` needs a gradient.
    pub fn wants(&self, input: usize) -> bool {
        self.wants.get(input).copied().unwrap_or(false)
    }

    /// The gradient buffer of input `input`, or `None` if it needs no gradient.
    pub fn grad_mut(&mut self, input: usize) -> Option<&mut DenseTensor<f32>> {
        if !self.wants(input) {
            return None;
        }
        let node = self.nodes[input];
        let grad = &mut self.grads[node];
        if !self.touched[node] {
            let buf = grad.prepare_output(&self.shapes[input]);
            self.device.backend().fill(0.0, buf);
            self.touched[node] = true;
        }
        Some(grad)
    }
}

/// Fails with `Dependency` unless exactly `expected` inputs were given.
pub(crate) fn expect_arity<T>(inputs: &[T], expected: usize, operator: &str) -> Result<(), GnnError> {
    if inputs.len() != expected {
        return Err(GnnError::Dependency {
            operator: operator.to_string(),
            node: format!("expected {} inputs, got {}", expected, inputs.len()),
        });
    }
    Ok(())
}

/// Fails with `DeviceMismatch` unless every input lives on `device`.
pub(crate) fn ensure_inputs_on(inputs: &[ValueRef<'_>], device: StorageDevice, operator: &str) -> Result<(), GnnError> {
    for input in inputs {
        ensure_device(device, input.device(), operator)?;
    }
    Ok(())
}

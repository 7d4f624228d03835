use crate::device::StorageDevice;
#[cfg(test)]
use crate::error::GnnError;
#[cfg(test)]
use crate::ops::{GradSink, NodeValue, Operator, ShapeHint, TensorSpec, ValueRef};
use crate::tensor::{DenseTensor, SparseTensor};
#[cfg(test)]
use crate::types::ValueKind;

/// Checks if a dense tensor is approximately equal to the expected shape and data.
/// Works for tensors on any device (data is read back through `to_vec`).
/// Panics if shapes differ or data differs by more than `tolerance`.
pub fn check_tensor_near(
    actual: &DenseTensor<f32>,
    expected_shape: &[usize],
    expected_data: &[f32],
    tolerance: f32,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data = actual.to_vec();
    assert_eq!(
        actual_data.len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual_data.iter().zip(expected_data.iter()).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a host f32 tensor for testing purposes.
pub fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> DenseTensor<f32> {
    DenseTensor::from_vec(data, &shape, StorageDevice::Host).expect("Failed to create test tensor")
}

/// Helper to create a host one-hot label matrix for testing purposes.
pub fn create_one_hot(labels: &[usize], classes: usize) -> SparseTensor {
    SparseTensor::from_one_hot(labels, classes, StorageDevice::Host).expect("Failed to create one-hot labels")
}

/// Runs `op` forward on `inputs` outside of any graph.
#[cfg(test)]
pub(crate) fn eval_operator(
    op: &dyn Operator,
    inputs: &[ValueRef<'_>],
    device: StorageDevice,
) -> Result<NodeValue, GnnError> {
    let specs: Vec<TensorSpec> = inputs
        .iter()
        .map(|v| TensorSpec::new(v.kind(), ShapeHint::known(&v.shape())))
        .collect();
    let spec = op.infer(&specs)?;
    let mut output = NodeValue::empty(spec.kind, device);
    op.forward(inputs, &mut output, device)?;
    Ok(output)
}

/// Runs `op` backward outside of any graph and returns the gradient of every
/// dense input (`None` for inputs that received no contribution).
#[cfg(test)]
pub(crate) fn backprop_operator(
    op: &dyn Operator,
    inputs: &[ValueRef<'_>],
    output: &NodeValue,
    grad_output: &DenseTensor<f32>,
) -> Result<Vec<Option<DenseTensor<f32>>>, GnnError> {
    let device = grad_output.device();
    let mut grads = vec![DenseTensor::new(device); inputs.len()];
    let mut touched = vec![false; inputs.len()];
    let nodes: Vec<usize> = (0..inputs.len()).collect();
    let wants = inputs.iter().map(|v| v.kind() == ValueKind::Dense).collect();
    let shapes = inputs.iter().map(|v| v.shape()).collect();
    {
        let mut sink = GradSink::new(device, &mut grads, &mut touched, &nodes, wants, shapes);
        op.backward(inputs, output, grad_output, &mut sink)?;
    }
    Ok(grads
        .into_iter()
        .zip(touched)
        .map(|(g, t)| if t { Some(g) } else { None })
        .collect())
}

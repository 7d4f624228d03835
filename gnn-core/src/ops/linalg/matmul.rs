use crate::device::{StorageDevice, Transpose};
use crate::error::GnnError;
use crate::ops::operator::{ensure_inputs_on, expect_arity, GradSink, Operator};
use crate::ops::value::{unify_dim, NodeValue, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;
use crate::types::ValueKind;

/// Dense matrix product `C = A @ B`.
///
/// A: `[M, K]`, B: `[K, N]` -> C: `[M, N]`. Backward:
/// `dA += dC @ B^T`, `dB += A^T @ dC`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatMul;

impl MatMul {
    fn dims(a: &DenseTensor<f32>, b: &DenseTensor<f32>) -> Result<(usize, usize, usize), GnnError> {
        if a.rank() != 2 || b.rank() != 2 || a.shape()[1] != b.shape()[0] {
            return Err(GnnError::shape(a.shape(), b.shape(), "MatMul"));
        }
        Ok((a.shape()[0], a.shape()[1], b.shape()[1]))
    }
}

impl Operator for MatMul {
    fn name(&self) -> &str {
        "MatMul"
    }

    fn infer(&self, inputs: &[TensorSpec]) -> Result<TensorSpec, GnnError> {
        expect_arity(inputs, 2, self.name())?;
        inputs[0].expect_kind(ValueKind::Dense, "MatMul lhs")?;
        inputs[1].expect_kind(ValueKind::Dense, "MatMul rhs")?;
        let a = inputs[0].shape.dims_of_rank(2, "MatMul lhs")?;
        let b = inputs[1].shape.dims_of_rank(2, "MatMul rhs")?;
        unify_dim(a[1], b[0]).map_err(|_| {
            GnnError::shape(&inputs[0].shape.display_dims(), &inputs[1].shape.display_dims(), "MatMul")
        })?;
        Ok(TensorSpec::dense(vec![a[0], b[1]]))
    }

    fn forward(&self, inputs: &[ValueRef<'_>], output: &mut NodeValue, device: StorageDevice) -> Result<(), GnnError> {
        expect_arity(inputs, 2, self.name())?;
        ensure_inputs_on(inputs, device, self.name())?;
        let a = inputs[0].as_dense(self.name())?;
        let b = inputs[1].as_dense(self.name())?;
        let (m, k, n) = MatMul::dims(a, b)?;

        let c = output.dense_mut(self.name())?.prepare_output(&[m, n]);
        device
            .backend()
            .gemm(Transpose::No, Transpose::No, m, n, k, 1.0, a.storage(), b.storage(), 0.0, c);
        Ok(())
    }

    fn backward(
        &self,
        inputs: &[ValueRef<'_>],
        _output: &NodeValue,
        grad_output: &DenseTensor<f32>,
        grads: &mut GradSink<'_>,
    ) -> Result<(), GnnError> {
        let a = inputs[0].as_dense(self.name())?;
        let b = inputs[1].as_dense(self.name())?;
        let (m, k, n) = MatMul::dims(a, b)?;
        if grad_output.shape() != [m, n].as_slice() {
            return Err(GnnError::shape(&[m, n], grad_output.shape(), "MatMul backward"));
        }
        let backend = grad_output.device().backend();

        if let Some(grad_a) = grads.grad_mut(0) {
            backend.gemm(
                Transpose::No,
                Transpose::Yes,
                m,
                k,
                n,
                1.0,
                grad_output.storage(),
                b.storage(),
                1.0,
                grad_a.storage_mut(),
            );
        }
        if let Some(grad_b) = grads.grad_mut(1) {
            backend.gemm(
                Transpose::Yes,
                Transpose::No,
                k,
                n,
                m,
                1.0,
                a.storage(),
                grad_output.storage(),
                1.0,
                grad_b.storage_mut(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "matmul_test.rs"]
mod tests;

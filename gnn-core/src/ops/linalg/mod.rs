pub mod matmul;

pub use matmul::MatMul;

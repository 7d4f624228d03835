pub mod cast;

pub use cast::TypeCast;

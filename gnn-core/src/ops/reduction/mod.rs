pub mod arg_max;
pub mod mean;

pub use arg_max::ArgMax;
pub use mean::ReduceMean;

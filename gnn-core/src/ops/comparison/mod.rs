pub mod in_top_k;

pub use in_top_k::InTopK;

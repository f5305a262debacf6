pub mod batch;
pub mod context;
pub mod runtime;

pub use runtime::*;

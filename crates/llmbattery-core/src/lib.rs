//! llmbattery core: owns native handle pairs and drives greedy generation
//! over any `InferenceEngine`.

pub mod backend;
pub mod engine;
pub mod error;
pub mod handle;
pub mod sampling;

pub use backend::Backend;
pub use engine::{GenerationOutcome, StopReason};
pub use error::{BridgeError, Result};
pub use handle::HandlePair;
pub use sampling::{Greedy, Sampler};

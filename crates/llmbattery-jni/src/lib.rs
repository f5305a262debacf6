//! JNI boundary for the llmbattery bridge.
//!
//! `registry` is engine-generic and testable without a JVM. The
//! `Java_com_research_llmbattery_LLMService_*` symbols only exist with the
//! `llama` feature, since they pin the registry to the llama.cpp engine.

pub mod logging;
pub mod marshal;
pub mod registry;

#[cfg(feature = "llama")]
pub mod exports;

pub use registry::{guarded, HandleRegistry, NULL_HANDLE};

//! llmbattery ABI crate: contracts shared by the bridge core, engine backends and the JNI layer.

pub mod backend;
pub mod batch;
pub mod params;
pub mod token;

pub use backend::*;
pub use batch::*;
pub use params::*;
pub use token::*;

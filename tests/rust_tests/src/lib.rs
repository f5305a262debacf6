//! Bridge behavior against a mock engine that counts every native call.

pub mod mock_engine;

#[cfg(test)]
mod encoder_test;

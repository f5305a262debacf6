use llmbattery_abi::batch::BatchOverflow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("session create failed: {0}")]
    SessionCreate(String),

    #[error("handle pair is not valid (released or never acquired)")]
    InvalidHandle,

    #[error(transparent)]
    BatchOverflow(#[from] BatchOverflow),

    #[error("forward step failed with status {0}")]
    Decode(i32),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("tokenization failed: {0}")]
    Tokenize(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

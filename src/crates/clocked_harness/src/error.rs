use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that abort a harness run before a verdict can be reached.
///
/// An output mismatch is not an error; it is reported through
/// [`crate::Verdict::Fail`].
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to construct model: {0}")]
    ModelConstruction(String),
    #[error("model has no port named `{0}`")]
    UnknownPort(String),
    #[error("port `{0}` is not an input")]
    NotAnInput(String),
    #[error("value {value:#x} does not fit in {width}-bit port `{port}`")]
    PortWidth { port: String, width: u32, value: u64 },
    #[error("failed to create log directory {path}: {source}")]
    LogDirectory { path: PathBuf, source: io::Error },
    #[error("failed to open trace file {path}: {source}")]
    TraceOpen { path: PathBuf, source: io::Error },
    #[error("trace recorder error: {0}")]
    Trace(String),
    #[error("invalid simulator argument `{0}`")]
    InvalidArgument(String),
    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl HarnessError {
    pub(crate) fn model_construction(err: impl Into<String>) -> Self {
        HarnessError::ModelConstruction(err.into())
    }

    pub(crate) fn trace(message: impl Into<String>) -> Self {
        HarnessError::Trace(message.into())
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        HarnessError::InvalidConfig(message.into())
    }
}

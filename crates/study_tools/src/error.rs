#![forbid(unsafe_code)]

use study_kernel_contracts::ContractViolation;
use study_os::config::ConfigError;
use study_os::runner::RunnerError;
use study_os::sequence::SequenceError;
use study_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot build session: {0}")]
    Sequence(#[from] SequenceError),

    #[error("session runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ToolError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::Config(_) => 2,
            _ => 1,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

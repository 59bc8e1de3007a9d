#![forbid(unsafe_code)]

use study_kernel_contracts::ContractViolation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote store rejected write with http status {status}")]
    Http { status: u16 },
    #[error("remote store unreachable: {0}")]
    Transport(String),
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error("record ledger for participant {participant_id} was already drained")]
    AlreadyDrained { participant_id: String },
}

#![forbid(unsafe_code)]

pub mod error;
pub mod fallback;
pub mod ledger;
pub mod store;
pub mod upload;

pub use error::StorageError;
pub use ledger::RecordLedger;
pub use store::{InMemoryStore, JsonFileStore, PersistenceAdapter, RealtimeDbConfig, RealtimeDbStore};
pub use upload::{upload_session, upload_session_at, UploadOutcome, UploadReport};

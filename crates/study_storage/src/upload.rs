#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use study_kernel_contracts::trial::UploadPayload;
use tracing::{info, warn};

use crate::fallback::write_fallback_csv;
use crate::{PersistenceAdapter, RecordLedger, StorageError};

pub const UPLOAD_ROOT: &str = "pilot_scenarios";
pub const TIMESTAMP_FIELD: &str = "timestamp";

pub const MSG_UPLOADED: &str =
    "Your responses have been securely logged, you may now close this window.";
pub const MSG_FELL_BACK_TO_LOCAL: &str =
    "Your responses could not be uploaded automatically, so they will download locally.";
pub const MSG_LOST: &str = "Your data may not have uploaded.";

// Lexically ordered alphabet, so keys sort in push order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded,
    FellBackToLocal { path: PathBuf },
    Lost,
}

impl UploadOutcome {
    pub fn participant_message(&self) -> &'static str {
        match self {
            UploadOutcome::Uploaded => MSG_UPLOADED,
            UploadOutcome::FellBackToLocal { .. } => MSG_FELL_BACK_TO_LOCAL,
            UploadOutcome::Lost => MSG_LOST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub participant_id: String,
    pub adapter: &'static str,
    pub outcome: UploadOutcome,
    pub entries: usize,
    pub timestamp_ms: u64,
    /// Adapter error text when the remote write failed.
    pub error: Option<String>,
}

fn encode_push_chars(mut value: u64, width: usize) -> String {
    let mut out = vec![b'-'; width];
    for slot in out.iter_mut().rev() {
        *slot = PUSH_CHARS[(value % 64) as usize];
        value /= 64;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// 20-character key: 8 chars of time, 12 chars of sequence.
pub fn push_key(timestamp_ms: u64, seq: u64) -> String {
    let mut key = encode_push_chars(timestamp_ms, 8);
    key.push_str(&encode_push_chars(seq, 12));
    key
}

fn with_timestamp<T: Serialize>(item: &T, timestamp_ms: u64) -> Result<Value, StorageError> {
    let mut value = serde_json::to_value(item)?;
    if let Value::Object(obj) = &mut value {
        obj.insert(TIMESTAMP_FIELD.to_string(), Value::from(timestamp_ms));
    }
    Ok(value)
}

/// Store path → value for everything in `payload`. Records go under
/// `pilot_scenarios/<participant_id>/<push key>`; a completion marker is
/// written at `pilot_scenarios/<participant_id>`.
pub fn build_updates(
    payload: &UploadPayload,
    timestamp_ms: u64,
) -> Result<BTreeMap<String, Value>, StorageError> {
    let prefix = format!("{UPLOAD_ROOT}/{}", payload.participant_id());
    let mut updates = BTreeMap::new();
    match payload {
        UploadPayload::Records { records, .. } => {
            for (seq, record) in records.iter().enumerate() {
                updates.insert(
                    format!("{prefix}/{}", push_key(timestamp_ms, seq as u64)),
                    with_timestamp(record, timestamp_ms)?,
                );
            }
        }
        UploadPayload::Completion(marker) => {
            // The marker is set on the participant node itself.
            updates.insert(prefix, with_timestamp(marker, timestamp_ms)?);
        }
    }
    Ok(updates)
}

pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn upload_session(
    ledger: &mut RecordLedger,
    adapter: &mut dyn PersistenceAdapter,
    fallback_dir: &Path,
) -> Result<UploadReport, StorageError> {
    upload_session_at(ledger, adapter, fallback_dir, unix_time_ms())
}

/// Drains the ledger and hands its payload to `adapter`, falling back to a
/// local CSV when the write fails.
///
/// Only a second drain is an error; write failures are reported through the outcome.
pub fn upload_session_at(
    ledger: &mut RecordLedger,
    adapter: &mut dyn PersistenceAdapter,
    fallback_dir: &Path,
    timestamp_ms: u64,
) -> Result<UploadReport, StorageError> {
    let payload = ledger.drain()?;
    let participant_id = payload.participant_id().to_string();
    let entries = payload.records().len();

    let write = build_updates(&payload, timestamp_ms)
        .and_then(|updates| adapter.write_updates(&updates));
    let (outcome, error) = match write {
        Ok(()) => {
            info!(participant_id = %participant_id, adapter = adapter.name(), entries, "session uploaded");
            (UploadOutcome::Uploaded, None)
        }
        Err(err) => {
            warn!(participant_id = %participant_id, adapter = adapter.name(), error = %err, "upload failed; exporting locally");
            match write_fallback_csv(fallback_dir, &payload, timestamp_ms) {
                Ok(path) => {
                    info!(path = %path.display(), "fallback export written");
                    (UploadOutcome::FellBackToLocal { path }, Some(err.to_string()))
                }
                Err(fallback_err) => {
                    warn!(participant_id = %participant_id, error = %fallback_err, "fallback export failed");
                    (UploadOutcome::Lost, Some(err.to_string()))
                }
            }
        }
    };
    Ok(UploadReport {
        participant_id,
        adapter: adapter.name(),
        outcome,
        entries,
        timestamp_ms,
        error,
    })
}

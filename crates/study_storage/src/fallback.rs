#![forbid(unsafe_code)]

//! Local CSV export used when the remote write fails.

use std::fs;
use std::path::{Path, PathBuf};

use study_kernel_contracts::trial::{ResponseStatus, TrialRecord, UploadPayload};

use crate::StorageError;

pub const CSV_COLUMNS: [&str; 13] = [
    "participant_id",
    "scenario_id",
    "scenario_kind",
    "phase",
    "candidate_id",
    "variant",
    "rating",
    "face_file",
    "audio_file",
    "modality",
    "rt_ms",
    "response_status",
    "timestamp",
];

pub fn fallback_file_name(participant_id: &str) -> String {
    format!("backup_{participant_id}.csv")
}

fn escape_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    escaped.join(",")
}

fn record_row(record: &TrialRecord, timestamp_ms: u64) -> Vec<String> {
    vec![
        record.participant_id.to_string(),
        record.scenario_id.as_str().to_string(),
        record.scenario_kind.as_str().to_string(),
        record.phase.as_str().to_string(),
        record.candidate_id.to_string(),
        record.variant.get().to_string(),
        record.rating.map(|r| r.to_string()).unwrap_or_default(),
        record.face_file.clone(),
        record.audio_file.clone(),
        record.modality.as_str().to_string(),
        record.rt_ms.map(|r| r.to_string()).unwrap_or_default(),
        match record.response_status {
            ResponseStatus::Ok => "ok",
            ResponseStatus::Malformed => "malformed",
        }
        .to_string(),
        timestamp_ms.to_string(),
    ]
}

/// Header plus one row per record. A completion marker exports as the header alone.
pub fn render_csv(payload: &UploadPayload, timestamp_ms: u64) -> String {
    let header: Vec<String> = CSV_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut out = csv_line(&header);
    out.push('\n');
    for record in payload.records() {
        out.push_str(&csv_line(&record_row(record, timestamp_ms)));
        out.push('\n');
    }
    out
}

pub fn write_fallback_csv(
    dir: &Path,
    payload: &UploadPayload,
    timestamp_ms: u64,
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(fallback_file_name(payload.participant_id().as_str()));
    fs::write(&path, render_csv(payload, timestamp_ms))?;
    Ok(path)
}

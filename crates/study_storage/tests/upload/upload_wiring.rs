#![forbid(unsafe_code)]

use study_kernel_contracts::participant::ParticipantId;
use study_kernel_contracts::scenario::{CandidateId, ScenarioId};
use study_kernel_contracts::stimulus::{Modality, Variant};
use study_kernel_contracts::trial::TrialRecord;
use study_storage::fallback::fallback_file_name;
use study_storage::upload::{MSG_FELL_BACK_TO_LOCAL, MSG_UPLOADED, UPLOAD_ROOT};
use study_storage::{
    upload_session_at, InMemoryStore, JsonFileStore, RecordLedger, StorageError, UploadOutcome,
};

const TS: u64 = 1_730_000_000_000;

fn pid() -> ParticipantId {
    ParticipantId::new("P123").unwrap()
}

fn ledger_with(n: usize) -> RecordLedger {
    let mut l = RecordLedger::new(pid());
    for i in 0..n {
        let candidate = CandidateId::new(format!("C{}", i % 3 + 1)).unwrap();
        l.append(
            TrialRecord::v1(
                pid(),
                ScenarioId::CeoA,
                candidate,
                Modality::Image,
                Variant::new(2).unwrap(),
                Some(4),
                "assets/faces/male/face01_var2.png".to_string(),
                Some(1500),
            )
            .unwrap(),
        )
        .unwrap();
    }
    l
}

#[test]
fn at_upload_wiring_01_records_land_under_participant_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryStore::new();
    let mut ledger = ledger_with(3);
    let report = upload_session_at(&mut ledger, &mut store, dir.path(), TS).unwrap();

    assert_eq!(report.outcome, UploadOutcome::Uploaded);
    assert_eq!(report.outcome.participant_message(), MSG_UPLOADED);
    assert_eq!(report.entries, 3);
    assert_eq!(store.entries().len(), 3);
    for (path, value) in store.entries() {
        assert!(path.starts_with(&format!("{UPLOAD_ROOT}/P123/")));
        assert_eq!(value["timestamp"], TS);
        assert_eq!(value["rating"], 4);
        assert_eq!(value["audio_file"], "");
    }
    assert!(!dir.path().join(fallback_file_name("P123")).exists());
}

#[test]
fn at_upload_wiring_02_empty_session_writes_completion_marker() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryStore::new();
    let mut ledger = ledger_with(0);
    let report = upload_session_at(&mut ledger, &mut store, dir.path(), TS).unwrap();

    assert_eq!(report.entries, 0);
    assert_eq!(store.entries().len(), 1);
    let marker = &store.entries()[&format!("{UPLOAD_ROOT}/P123")];
    assert_eq!(marker["completed"], true);
    assert_eq!(marker["participant_id"], "P123");
    assert_eq!(marker["timestamp"], TS);
}

#[test]
fn at_upload_wiring_03_failed_write_falls_back_to_local_csv() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryStore::unavailable();
    let mut ledger = ledger_with(2);
    let report = upload_session_at(&mut ledger, &mut store, dir.path(), TS).unwrap();

    let expected = dir.path().join(fallback_file_name("P123"));
    assert_eq!(report.outcome, UploadOutcome::FellBackToLocal { path: expected.clone() });
    assert_eq!(report.outcome.participant_message(), MSG_FELL_BACK_TO_LOCAL);
    assert!(report.error.is_some());
    let csv = std::fs::read_to_string(expected).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().starts_with("P123,CEO_A,CEO,bio_plus_face,C1,2,4,"));
}

#[test]
fn at_upload_wiring_04_unwritable_fallback_is_lost_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();
    let mut store = InMemoryStore::unavailable();
    let mut ledger = ledger_with(1);
    let report = upload_session_at(&mut ledger, &mut store, &blocker, TS).unwrap();
    assert_eq!(report.outcome, UploadOutcome::Lost);
    assert_eq!(report.outcome.participant_message(), "Your data may not have uploaded.");
}

#[test]
fn at_upload_wiring_05_ledger_hands_off_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryStore::new();
    let mut ledger = ledger_with(1);
    upload_session_at(&mut ledger, &mut store, dir.path(), TS).unwrap();
    let second = upload_session_at(&mut ledger, &mut store, dir.path(), TS + 1);
    assert!(matches!(second, Err(StorageError::AlreadyDrained { .. })));
    assert_eq!(store.write_calls(), 1);
}

#[test]
fn at_upload_wiring_06_json_file_store_merges_sessions_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());

    let mut first = ledger_with(2);
    upload_session_at(&mut first, &mut store, dir.path(), TS).unwrap();
    let mut second = ledger_with(1);
    upload_session_at(&mut second, &mut store, dir.path(), TS + 5_000).unwrap();

    let doc = store.load("P123").unwrap();
    assert_eq!(doc.len(), 3);
    assert!(doc.keys().all(|k| k.starts_with("pilot_scenarios/P123/")));
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn at_upload_wiring_07_ids_that_would_split_store_paths_never_reach_storage() {
    for raw in ["lab/P9", "../P9", "P9.json", "P#9"] {
        assert!(ParticipantId::new(raw).is_err(), "{raw} should be rejected");
    }

    let dir = tempfile::tempdir().unwrap();
    let id = ParticipantId::new("lab-P9").unwrap();
    let mut ledger = RecordLedger::new(id.clone());
    let mut store = InMemoryStore::unavailable();
    let report = upload_session_at(&mut ledger, &mut store, dir.path(), TS).unwrap();
    let expected = dir.path().join(fallback_file_name(id.as_str()));
    assert_eq!(report.outcome, UploadOutcome::FellBackToLocal { path: expected.clone() });
    assert!(expected.exists());

    let mut json = JsonFileStore::new(dir.path());
    let mut ledger = RecordLedger::new(id);
    upload_session_at(&mut ledger, &mut json, dir.path(), TS).unwrap();
    let doc = json.load("lab-P9").unwrap();
    assert!(doc.contains_key(&format!("{UPLOAD_ROOT}/lab-P9")));
}

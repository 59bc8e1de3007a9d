#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use rand::Rng;
use study_engines::audio_gate::{GateOutput, MediaEvent};
use study_engines::modality::ModalityStrategy;
use study_engines::response::RawResponse;
use study_engines::rng::session_rng;
use study_engines::variant::VariantPolicy;
use study_kernel_contracts::gate::AudioGateMode;
use study_kernel_contracts::scenario::RoleKind;
use study_kernel_contracts::stimulus::Modality;
use study_kernel_contracts::trial::{TrialRecord, UploadPayload};
use study_os::config::StudyConfig;
use study_os::runner::SessionRunner;
use study_os::start_runner;
use study_storage::{upload_session_at, InMemoryStore, UploadOutcome};

/// Plays the whole session the way a cooperative participant would.
fn play_through(runner: &mut SessionRunner, mode: AudioGateMode, seed: u64) -> Vec<TrialRecord> {
    let mut rng = session_rng(Some(seed));
    let mut records = Vec::new();
    while !runner.is_finished() {
        let activation = runner.activate_current().unwrap();
        let context = activation.unit.body.candidate_context().cloned();
        let locked = activation.gate.is_some_and(|g| g.is_locked());
        if locked {
            match mode {
                AudioGateMode::MustPlayFull => {
                    runner.on_media_event(MediaEvent::TimeUpdate { position_s: 2.0 });
                    assert!(matches!(runner.on_media_event(MediaEvent::Ended), GateOutput::Unlocked { .. }));
                }
                AudioGateMode::MinSeconds => {
                    let mut t = 0.0;
                    while runner.gate().is_some_and(|g| g.is_locked()) {
                        runner.on_media_event(MediaEvent::TimeUpdate { position_s: t });
                        t += 0.25;
                    }
                }
                AudioGateMode::Free => unreachable!("free mode never locks"),
            }
        }
        let raw = context
            .as_ref()
            .map(|c| RawResponse::answer(&c.question_key, rng.gen_range(0..=6), Some(rng.gen_range(500..9000))));
        if let Some(record) = runner.complete_current(raw.as_ref()).unwrap() {
            records.push(record);
        }
    }
    records
}

fn assert_complete_session(records: &[TrialRecord]) {
    assert_eq!(records.len(), 12);
    for r in records {
        assert!(!r.scenario_id.as_str().is_empty());
        let rating = r.rating.expect("cooperative answers are never malformed");
        assert!((1..=7).contains(&rating));
        match r.modality {
            Modality::Image => {
                assert!(!r.face_file.is_empty());
                assert!(r.audio_file.is_empty());
            }
            Modality::Audio => {
                assert!(r.face_file.is_empty());
                assert!(!r.audio_file.is_empty());
            }
        }
    }
    for kind in RoleKind::ALL {
        let modalities: BTreeSet<Modality> = records
            .iter()
            .filter(|r| r.scenario_kind == kind)
            .map(|r| r.modality)
            .collect();
        assert_eq!(modalities.len(), 2);
    }
}

#[test]
fn at_e2e_01_pilot_session_yields_twelve_records_and_uploads() {
    let mut cfg = StudyConfig::pilot_v1();
    cfg.rng_seed = Some(2024);
    let (session, mut runner) = start_runner(cfg, Some("PILOT01")).unwrap();
    let records = play_through(&mut runner, session.config.audio.mode, 1);
    assert_complete_session(&records);

    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryStore::new();
    let report = upload_session_at(runner.ledger_mut(), &mut store, dir.path(), 1_000).unwrap();
    assert_eq!(report.outcome, UploadOutcome::Uploaded);
    assert_eq!(store.entries().len(), 12);
}

#[test]
fn at_e2e_02_min_seconds_gate_with_hash_derived_assignment() {
    let mut cfg = StudyConfig::pilot_v1();
    cfg.rng_seed = Some(7);
    cfg.audio.mode = AudioGateMode::MinSeconds;
    cfg.modality_strategy = ModalityStrategy::HashDerived;
    cfg.variant_policy = VariantPolicy::FixedPerParticipant;
    let (session, mut runner) = start_runner(cfg, Some("P314")).unwrap();
    let records = play_through(&mut runner, AudioGateMode::MinSeconds, 2);
    assert_complete_session(&records);

    let fixed = session.participant.hash.fixed_variant();
    assert!(records.iter().all(|r| r.variant == fixed));
    for r in &records {
        assert_eq!(session.modality.get(r.scenario_id), Some(r.modality));
    }
}

#[test]
fn at_e2e_03_audio_mapping_is_stable_across_sessions() {
    let mut paths = Vec::new();
    for seed in [1_u64, 2, 3] {
        let mut cfg = StudyConfig::pilot_v1();
        cfg.rng_seed = Some(seed);
        cfg.audio.mode = AudioGateMode::Free;
        cfg.variant_policy = VariantPolicy::FixedPerParticipant;
        cfg.modality_strategy = ModalityStrategy::HashDerived;
        let (_, mut runner) = start_runner(cfg, Some("same-person")).unwrap();
        let mut audio: Vec<String> = play_through(&mut runner, AudioGateMode::Free, seed)
            .into_iter()
            .filter(|r| r.modality == Modality::Audio)
            .map(|r| format!("{}:{}", r.candidate_id, r.audio_file))
            .collect();
        audio.sort();
        paths.push(audio);
    }
    assert_eq!(paths[0].len(), 6);
    assert_eq!(paths[0], paths[1]);
    assert_eq!(paths[1], paths[2]);
}

#[test]
fn at_e2e_04_abandoned_session_uploads_completion_marker() {
    let mut cfg = StudyConfig::pilot_v1();
    cfg.rng_seed = Some(5);
    let (_, mut runner) = start_runner(cfg, None).unwrap();
    // Welcome and instructions only, then the participant leaves.
    for _ in 0..2 {
        runner.activate_current();
        runner.complete_current(None).unwrap();
    }
    let mut ledger = runner.into_ledger();
    let pid = ledger.participant_id().to_string();
    assert!(pid.starts_with('P'));
    match ledger.drain().unwrap() {
        UploadPayload::Completion(marker) => assert!(marker.completed),
        other => panic!("expected completion marker, got {other:?}"),
    }
}

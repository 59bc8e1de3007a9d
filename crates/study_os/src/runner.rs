#![forbid(unsafe_code)]

use study_engines::audio_gate::{AudioGate, GateOutput, MediaEvent};
use study_engines::response::{normalize_response, RawResponse};
use study_kernel_contracts::gate::{AudioPresentationPolicy, ControlState};
use study_kernel_contracts::timeline::{PresentationUnit, UnitId};
use study_kernel_contracts::trial::TrialRecord;
use study_kernel_contracts::ContractViolation;
use study_storage::{RecordLedger, StorageError};
use thiserror::Error;
use tracing::{debug, info};

use crate::sequence::SessionTimeline;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unit {unit_id:?} cannot complete while its audio gate is locked")]
    GateLocked { unit_id: UnitId },
    #[error("unit {unit_id:?} was completed before being activated")]
    NotActive { unit_id: UnitId },
    #[error("session has no units left")]
    Finished,
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What the presentation runtime needs when a unit becomes active.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation<'a> {
    pub unit: &'a PresentationUnit,
    /// Present only on rating units; locked when an audio gate applies.
    pub controls: Option<ControlState>,
    pub gate: Option<&'a AudioGate>,
}

/// Walks a session's units strictly in order. At most one unit is active and
/// only it may hold an audio gate.
#[derive(Debug, Clone)]
pub struct SessionRunner {
    audio_policy: AudioPresentationPolicy,
    units: Vec<PresentationUnit>,
    cursor: usize,
    active: bool,
    gate: Option<AudioGate>,
    ledger: RecordLedger,
}

impl SessionRunner {
    pub fn new(timeline: SessionTimeline, audio_policy: AudioPresentationPolicy) -> Self {
        Self {
            audio_policy,
            ledger: RecordLedger::new(timeline.participant_id),
            units: timeline.units,
            cursor: 0,
            active: false,
            gate: None,
        }
    }

    pub fn current(&self) -> Option<&PresentationUnit> {
        self.units.get(self.cursor)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.units.len().saturating_sub(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.units.len()
    }

    pub fn gate(&self) -> Option<&AudioGate> {
        self.gate.as_ref()
    }

    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut RecordLedger {
        &mut self.ledger
    }

    pub fn into_ledger(self) -> RecordLedger {
        self.ledger
    }

    /// Activates the current unit. Re-activating an active unit keeps its gate state.
    pub fn activate_current(&mut self) -> Option<Activation<'_>> {
        let unit = self.units.get(self.cursor)?;
        if !self.active {
            self.active = true;
            self.gate = unit
                .body
                .candidate_context()
                .map(|ctx| AudioGate::activate(self.audio_policy, ctx.modality));
            debug!(unit_id = unit.unit_id.0, trial_type = unit.body.trial_type(), "unit activated");
        }
        Some(Activation {
            unit,
            controls: self.gate.as_ref().map(AudioGate::controls),
            gate: self.gate.as_ref(),
        })
    }

    /// Routes a media signal to the active gate. Ignored when nothing gated is active.
    pub fn on_media_event(&mut self, event: MediaEvent) -> GateOutput {
        if !self.active {
            return GateOutput::NoChange;
        }
        match self.gate.as_mut() {
            Some(gate) => gate.handle(event),
            None => GateOutput::NoChange,
        }
    }

    /// Completes the active unit and advances. Rating units are normalized
    /// into the ledger; a missing response is recorded as malformed.
    pub fn complete_current(
        &mut self,
        response: Option<&RawResponse>,
    ) -> Result<Option<TrialRecord>, RunnerError> {
        let unit = self.units.get(self.cursor).ok_or(RunnerError::Finished)?;
        if !self.active {
            return Err(RunnerError::NotActive {
                unit_id: unit.unit_id,
            });
        }
        if self.gate.as_ref().is_some_and(AudioGate::is_locked) {
            return Err(RunnerError::GateLocked {
                unit_id: unit.unit_id,
            });
        }

        let record = match unit.body.candidate_context() {
            Some(ctx) => {
                let empty = RawResponse::default();
                let record = normalize_response(
                    self.ledger.participant_id(),
                    ctx,
                    response.unwrap_or(&empty),
                )?;
                self.ledger.append(record.clone())?;
                Some(record)
            }
            None => None,
        };

        self.cursor += 1;
        self.active = false;
        self.gate = None;
        if self.is_finished() {
            info!(
                participant_id = %self.ledger.participant_id(),
                records = self.ledger.len(),
                "session complete"
            );
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyConfig;
    use crate::sequence::build_session_timeline;
    use crate::session::SessionConfiguration;
    use study_engines::rng::session_rng;
    use study_kernel_contracts::gate::AudioGateMode;
    use study_kernel_contracts::stimulus::Modality;
    use study_kernel_contracts::timeline::UnitBody;

    fn runner(cfg: StudyConfig) -> SessionRunner {
        let mut rng = session_rng(Some(21));
        let s = SessionConfiguration::establish(cfg, Some("P5"), &mut rng).unwrap();
        let t = build_session_timeline(&s, &mut rng).unwrap();
        SessionRunner::new(t, s.config.audio)
    }

    fn advance_to(r: &mut SessionRunner, modality: Modality) {
        loop {
            let unit = r.current().unwrap();
            if unit.body.candidate_context().map(|c| c.modality) == Some(modality) {
                return;
            }
            r.activate_current();
            r.complete_current(None).unwrap();
        }
    }

    #[test]
    fn at_runner_01_completion_requires_activation() {
        let mut r = runner(StudyConfig::pilot_v1());
        assert!(matches!(r.complete_current(None), Err(RunnerError::NotActive { .. })));
        let a = r.activate_current().unwrap();
        assert!(matches!(a.unit.body, UnitBody::Welcome { .. }));
        assert!(a.controls.is_none());
        assert_eq!(r.complete_current(None).unwrap(), None);
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn at_runner_02_locked_audio_unit_cannot_complete() {
        let mut r = runner(StudyConfig::pilot_v1());
        advance_to(&mut r, Modality::Audio);
        let a = r.activate_current().unwrap();
        assert!(!a.controls.unwrap().rating_enabled);
        let key = a.unit.body.candidate_context().unwrap().question_key.clone();
        let raw = RawResponse::answer(&key, 3, Some(4000));

        assert!(matches!(r.complete_current(Some(&raw)), Err(RunnerError::GateLocked { .. })));
        assert!(matches!(r.on_media_event(MediaEvent::Ended), GateOutput::Unlocked { .. }));
        let rec = r.complete_current(Some(&raw)).unwrap().unwrap();
        assert_eq!(rec.rating, Some(4));
        assert!(!rec.audio_file.is_empty());
        assert!(rec.face_file.is_empty());
        assert_eq!(r.ledger().len(), 1);
        assert!(r.gate().is_none());
    }

    #[test]
    fn at_runner_03_image_units_start_unlocked() {
        let mut r = runner(StudyConfig::pilot_v1());
        advance_to(&mut r, Modality::Image);
        let a = r.activate_current().unwrap();
        assert!(a.controls.unwrap().rating_enabled);
        assert_eq!(r.on_media_event(MediaEvent::Ended), GateOutput::NoChange);
        let rec = r.complete_current(None).unwrap().unwrap();
        assert_eq!(rec.rating, None);
    }

    #[test]
    fn at_runner_04_free_mode_never_locks() {
        let mut cfg = StudyConfig::pilot_v1();
        cfg.audio.mode = AudioGateMode::Free;
        let mut r = runner(cfg);
        advance_to(&mut r, Modality::Audio);
        r.activate_current();
        assert!(r.complete_current(None).is_ok());
    }

    #[test]
    fn at_runner_05_events_before_activation_are_ignored() {
        let mut r = runner(StudyConfig::pilot_v1());
        advance_to(&mut r, Modality::Audio);
        assert_eq!(r.on_media_event(MediaEvent::Ended), GateOutput::NoChange);
        r.activate_current();
        assert!(r.gate().unwrap().is_locked());
    }

    #[test]
    fn at_runner_06_finished_session_rejects_completion() {
        let mut cfg = StudyConfig::pilot_v1();
        cfg.audio.mode = AudioGateMode::Free;
        let mut r = runner(cfg);
        while !r.is_finished() {
            r.activate_current();
            r.complete_current(None).unwrap();
        }
        assert!(r.activate_current().is_none());
        assert!(matches!(r.complete_current(None), Err(RunnerError::Finished)));
        assert_eq!(r.ledger().len(), 12);
    }
}

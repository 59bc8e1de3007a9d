#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;
use crate::scenario::{CandidateId, RoleKind, ScenarioId};
use crate::stimulus::{Modality, Variant};
use crate::{ContractViolation, SchemaVersion, Validate};

pub const TRIAL_RECORD_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    BioPlusFace,
    BioPlusAudio,
}

impl TrialPhase {
    pub fn for_modality(modality: Modality) -> Self {
        match modality {
            Modality::Image => TrialPhase::BioPlusFace,
            Modality::Audio => TrialPhase::BioPlusAudio,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrialPhase::BioPlusFace => "bio_plus_face",
            TrialPhase::BioPlusAudio => "bio_plus_audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Malformed,
}

/// One candidate rating. Created once when its rating unit completes; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: ParticipantId,
    pub scenario_id: ScenarioId,
    pub scenario_kind: RoleKind,
    pub phase: TrialPhase,
    pub candidate_id: CandidateId,
    pub variant: Variant,
    /// External 1..=7 rating; `None` when the raw answer was malformed.
    pub rating: Option<u8>,
    pub face_file: String,
    pub audio_file: String,
    pub modality: Modality,
    pub rt_ms: Option<u64>,
    pub response_status: ResponseStatus,
}

impl TrialRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        participant_id: ParticipantId,
        scenario_id: ScenarioId,
        candidate_id: CandidateId,
        modality: Modality,
        variant: Variant,
        rating: Option<u8>,
        asset_path: String,
        rt_ms: Option<u64>,
    ) -> Result<Self, ContractViolation> {
        let (face_file, audio_file) = match modality {
            Modality::Image => (asset_path, String::new()),
            Modality::Audio => (String::new(), asset_path),
        };
        let record = Self {
            participant_id,
            scenario_id,
            scenario_kind: scenario_id.role_kind(),
            phase: TrialPhase::for_modality(modality),
            candidate_id,
            variant,
            rating,
            face_file,
            audio_file,
            modality,
            rt_ms,
            response_status: if rating.is_some() {
                ResponseStatus::Ok
            } else {
                ResponseStatus::Malformed
            },
        };
        record.validate()?;
        Ok(record)
    }

    pub fn asset_path(&self) -> &str {
        match self.modality {
            Modality::Image => &self.face_file,
            Modality::Audio => &self.audio_file,
        }
    }
}

impl Validate for TrialRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.participant_id.validate()?;
        self.candidate_id.validate()?;
        self.variant.validate()?;
        if self.scenario_kind != self.scenario_id.role_kind() {
            return Err(ContractViolation::InvalidValue {
                field: "trial_record.scenario_kind",
                reason: "must match scenario_id",
            });
        }
        if self.phase != TrialPhase::for_modality(self.modality) {
            return Err(ContractViolation::InvalidValue {
                field: "trial_record.phase",
                reason: "must match modality",
            });
        }
        let (populated, empty) = match self.modality {
            Modality::Image => (&self.face_file, &self.audio_file),
            Modality::Audio => (&self.audio_file, &self.face_file),
        };
        if populated.trim().is_empty() || !empty.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "trial_record.asset_path",
                reason: "exactly the file matching the modality must be populated",
            });
        }
        match (self.rating, self.response_status) {
            (Some(r), ResponseStatus::Ok) if (RATING_MIN..=RATING_MAX).contains(&r) => {}
            (Some(r), ResponseStatus::Ok) => {
                return Err(ContractViolation::InvalidRange {
                    field: "trial_record.rating",
                    min: f64::from(RATING_MIN),
                    max: f64::from(RATING_MAX),
                    got: f64::from(r),
                });
            }
            (None, ResponseStatus::Malformed) => {}
            _ => {
                return Err(ContractViolation::InvalidValue {
                    field: "trial_record.response_status",
                    reason: "must be ok iff a rating is present",
                });
            }
        }
        Ok(())
    }
}

/// Written instead of records when a session ends with no ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub participant_id: ParticipantId,
    pub completed: bool,
}

impl CompletionMarker {
    pub fn v1(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            completed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadPayload {
    Records {
        participant_id: ParticipantId,
        records: Vec<TrialRecord>,
    },
    Completion(CompletionMarker),
}

impl UploadPayload {
    pub fn participant_id(&self) -> &ParticipantId {
        match self {
            UploadPayload::Records { participant_id, .. } => participant_id,
            UploadPayload::Completion(m) => &m.participant_id,
        }
    }

    pub fn records(&self) -> &[TrialRecord] {
        match self {
            UploadPayload::Records { records, .. } => records,
            UploadPayload::Completion(_) => &[],
        }
    }
}

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::scenario::{CandidateId, RoleKind, ScenarioId};
use crate::stimulus::{AssetIndex, Modality, Variant};
use crate::trial::TrialPhase;
use crate::{ContractViolation, Validate};

pub const QUESTION_KEY_DELIM: &str = "::";
pub const RATING_SCALE_LABELS: [&str; 7] = ["1", "2", "3", "4", "5", "6", "7"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Input the presentation runtime waits for before advancing past a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdvanceInput {
    Key { key: char },
    ContinueButton,
    NavigationButton,
    Timer { duration_ms: u32 },
    Automatic,
}

/// Everything a rating unit needs through its lifecycle, carried by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUnitContext {
    pub scenario_id: ScenarioId,
    pub scenario_kind: RoleKind,
    /// 1-based position of the scenario within the session.
    pub scenario_ordinal: u8,
    pub candidate_id: CandidateId,
    /// 1-based display position of the candidate within the scenario.
    pub display_position: u8,
    pub modality: Modality,
    pub asset_index: AssetIndex,
    pub variant: Variant,
    pub asset_path: String,
    pub question_key: String,
}

impl CandidateUnitContext {
    pub fn question_key_for(
        scenario_id: ScenarioId,
        modality: Modality,
        candidate_id: &CandidateId,
    ) -> String {
        format!(
            "{}{QUESTION_KEY_DELIM}{}{QUESTION_KEY_DELIM}{}",
            scenario_id.as_str(),
            modality.as_str(),
            candidate_id.as_str()
        )
    }

    pub fn phase(&self) -> TrialPhase {
        TrialPhase::for_modality(self.modality)
    }
}

impl Validate for CandidateUnitContext {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.candidate_id.validate()?;
        self.variant.validate()?;
        self.asset_index.validate()?;
        if self.scenario_kind != self.scenario_id.role_kind() {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.scenario_kind",
                reason: "must match scenario_id",
            });
        }
        if !self.asset_index.fits(self.modality) {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.asset_index",
                reason: "index outside the modality's range",
            });
        }
        if !(1..=4).contains(&self.scenario_ordinal) {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.scenario_ordinal",
                reason: "must be within 1..=4",
            });
        }
        if !(1..=3).contains(&self.display_position) {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.display_position",
                reason: "must be within 1..=3",
            });
        }
        if self.asset_path.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.asset_path",
                reason: "must not be empty",
            });
        }
        if self.question_key
            != Self::question_key_for(self.scenario_id, self.modality, &self.candidate_id)
        {
            return Err(ContractViolation::InvalidValue {
                field: "candidate_unit_context.question_key",
                reason: "must be scenario::modality::candidate",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRatingBody {
    pub context: CandidateUnitContext,
    pub scenario_title: String,
    pub scenario_text: String,
    pub candidate_name: String,
    pub candidate_bio: String,
    pub prompt: String,
    pub scale_labels: Vec<String>,
    pub gate_hint: Option<String>,
    /// Audio pages tell the participant the bio text matches the recording.
    pub transcript_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum UnitBody {
    Welcome {
        heading: String,
        paragraphs: Vec<String>,
    },
    Instructions {
        pages: Vec<String>,
    },
    Preload {
        images: Vec<String>,
        audio: Vec<String>,
    },
    Announcement {
        scenario_id: ScenarioId,
        ordinal: u8,
        ordinal_word: String,
    },
    Preface {
        scenario_id: ScenarioId,
        scenario_kind: RoleKind,
        modality: Modality,
        title: String,
        text: String,
    },
    CandidateRating(Box<CandidateRatingBody>),
    Fixation {
        scenario_id: ScenarioId,
        duration_ms: u32,
    },
    Closing {
        heading: String,
        message: String,
    },
}

impl UnitBody {
    /// Label stored alongside runtime data for this unit.
    pub fn trial_type(&self) -> &'static str {
        match self {
            UnitBody::Welcome { .. } => "welcome",
            UnitBody::Instructions { .. } => "instructions",
            UnitBody::Preload { .. } => "preload",
            UnitBody::Announcement { .. } => "scenario_announce",
            UnitBody::Preface { .. } => "preface",
            UnitBody::CandidateRating(body) => body.context.phase().as_str(),
            UnitBody::Fixation { .. } => "candidate_ISI",
            UnitBody::Closing { .. } => "closing",
        }
    }

    pub fn scenario_id(&self) -> Option<ScenarioId> {
        match self {
            UnitBody::Announcement { scenario_id, .. }
            | UnitBody::Preface { scenario_id, .. }
            | UnitBody::Fixation { scenario_id, .. } => Some(*scenario_id),
            UnitBody::CandidateRating(body) => Some(body.context.scenario_id),
            _ => None,
        }
    }

    pub fn candidate_context(&self) -> Option<&CandidateUnitContext> {
        match self {
            UnitBody::CandidateRating(body) => Some(&body.context),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationUnit {
    pub unit_id: UnitId,
    pub advance: AdvanceInput,
    pub body: UnitBody,
}

impl Validate for PresentationUnit {
    fn validate(&self) -> Result<(), ContractViolation> {
        match (&self.body, self.advance) {
            (UnitBody::CandidateRating(body), AdvanceInput::ContinueButton) => {
                body.context.validate()
            }
            (UnitBody::CandidateRating(_), _) => Err(ContractViolation::InvalidValue {
                field: "presentation_unit.advance",
                reason: "rating units advance with the continue button",
            }),
            (UnitBody::Fixation { duration_ms, .. }, AdvanceInput::Timer { duration_ms: t })
                if *duration_ms == t && t > 0 =>
            {
                Ok(())
            }
            (UnitBody::Fixation { .. }, _) => Err(ContractViolation::InvalidValue {
                field: "presentation_unit.advance",
                reason: "fixation units advance on a non-zero timer of their own duration",
            }),
            _ => Ok(()),
        }
    }
}

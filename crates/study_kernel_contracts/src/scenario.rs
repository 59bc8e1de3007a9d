#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::validate_token;
use crate::stimulus::GenderCategory;
use crate::{ContractViolation, Validate};

pub const CANDIDATES_PER_SCENARIO: usize = 3;
pub const SCENARIOS_PER_SESSION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    #[serde(rename = "CEO")]
    Executive,
    #[serde(rename = "ECE")]
    Educator,
}

impl RoleKind {
    pub const ALL: [RoleKind; 2] = [RoleKind::Executive, RoleKind::Educator];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Executive => "CEO",
            RoleKind::Educator => "ECE",
        }
    }

    pub fn gender(self) -> GenderCategory {
        match self {
            RoleKind::Executive => GenderCategory::Male,
            RoleKind::Educator => GenderCategory::Female,
        }
    }

    /// The two scenarios of this role kind, first family first.
    pub fn pair(self) -> [ScenarioId; 2] {
        match self {
            RoleKind::Executive => [ScenarioId::CeoA, ScenarioId::CeoB],
            RoleKind::Educator => [ScenarioId::EceA, ScenarioId::EceB],
        }
    }
}

/// First or second scenario of its role kind. Selects the audio index base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioFamily {
    First,
    Second,
}

impl ScenarioFamily {
    pub fn audio_index_base(self) -> u8 {
        match self {
            ScenarioFamily::First => 1,
            ScenarioFamily::Second => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScenarioId {
    #[serde(rename = "CEO_A")]
    CeoA,
    #[serde(rename = "CEO_B")]
    CeoB,
    #[serde(rename = "ECE_A")]
    EceA,
    #[serde(rename = "ECE_B")]
    EceB,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; SCENARIOS_PER_SESSION] = [
        ScenarioId::CeoA,
        ScenarioId::CeoB,
        ScenarioId::EceA,
        ScenarioId::EceB,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioId::CeoA => "CEO_A",
            ScenarioId::CeoB => "CEO_B",
            ScenarioId::EceA => "ECE_A",
            ScenarioId::EceB => "ECE_B",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw)
    }

    pub fn role_kind(self) -> RoleKind {
        match self {
            ScenarioId::CeoA | ScenarioId::CeoB => RoleKind::Executive,
            ScenarioId::EceA | ScenarioId::EceB => RoleKind::Educator,
        }
    }

    pub fn family(self) -> ScenarioFamily {
        match self {
            ScenarioId::CeoA | ScenarioId::EceA => ScenarioFamily::First,
            ScenarioId::CeoB | ScenarioId::EceB => ScenarioFamily::Second,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate token within a scenario (`C1`, `C2`, `C3`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(raw.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits of the token read as a number (`C2` -> 2). `None` when the token has no digits.
    pub fn ordinal(&self) -> Option<u32> {
        let digits: String = self.0.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

impl Validate for CandidateId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("candidate_id", &self.0, 16)
    }
}

impl TryFrom<String> for CandidateId {
    type Error = ContractViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CandidateId> for String {
    fn from(value: CandidateId) -> Self {
        value.0
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub bio: String,
}

impl Validate for Candidate {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.id.validate()?;
        if self.name.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "candidate.name",
                reason: "must not be empty",
            });
        }
        if self.bio.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "candidate.bio",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub text: String,
    pub candidates: Vec<Candidate>,
}

impl Scenario {
    pub fn kind(&self) -> RoleKind {
        self.id.role_kind()
    }
}

impl Validate for Scenario {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.title.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "scenario.title",
                reason: "must not be empty",
            });
        }
        if self.text.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "scenario.text",
                reason: "must not be empty",
            });
        }
        if self.candidates.len() != CANDIDATES_PER_SCENARIO {
            return Err(ContractViolation::InvalidValue {
                field: "scenario.candidates",
                reason: "must contain exactly 3 candidates",
            });
        }
        let mut seen = BTreeSet::new();
        for c in &self.candidates {
            c.validate()?;
            if !seen.insert(c.id.clone()) {
                return Err(ContractViolation::InvalidValue {
                    field: "scenario.candidates",
                    reason: "candidate ids must be unique",
                });
            }
        }
        Ok(())
    }
}

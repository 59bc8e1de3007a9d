#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::scenario::{CandidateId, RoleKind, ScenarioId};
use crate::{ContractViolation, Validate};

pub const VARIANT_COUNT: u8 = 3;
pub const IMAGE_INDEX_MAX: u8 = 3;
pub const AUDIO_INDEX_MAX: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Image,
    Audio,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderCategory {
    Male,
    Female,
}

impl GenderCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            GenderCategory::Male => "male",
            GenderCategory::Female => "female",
        }
    }
}

/// Rendition number of a face or voice asset, always within 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Variant(u8);

impl Variant {
    pub const ALL: [Variant; 3] = [Variant(1), Variant(2), Variant(3)];

    pub fn new(v: u8) -> Result<Self, ContractViolation> {
        let variant = Self(v);
        variant.validate()?;
        Ok(variant)
    }

    pub(crate) fn from_zero_based_mod3(n: u32) -> Self {
        // n % 3 is in 0..=2, so the result is always in 1..=3.
        Self((n % u32::from(VARIANT_COUNT)) as u8 + 1)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Validate for Variant {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !(1..=VARIANT_COUNT).contains(&self.0) {
            return Err(ContractViolation::InvalidRange {
                field: "variant",
                min: 1.0,
                max: f64::from(VARIANT_COUNT),
                got: f64::from(self.0),
            });
        }
        Ok(())
    }
}

impl TryFrom<u8> for Variant {
    type Error = ContractViolation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Variant> for u8 {
    fn from(value: Variant) -> Self {
        value.0
    }
}

/// Physical asset number: faces use 1..=3, voices 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AssetIndex(u8);

impl AssetIndex {
    pub fn new(v: u8) -> Result<Self, ContractViolation> {
        let idx = Self(v);
        idx.validate()?;
        Ok(idx)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn fits(self, modality: Modality) -> bool {
        match modality {
            Modality::Image => self.0 <= IMAGE_INDEX_MAX,
            Modality::Audio => self.0 <= AUDIO_INDEX_MAX,
        }
    }
}

impl Validate for AssetIndex {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !(1..=AUDIO_INDEX_MAX).contains(&self.0) {
            return Err(ContractViolation::InvalidRange {
                field: "asset_index",
                min: 1.0,
                max: f64::from(AUDIO_INDEX_MAX),
                got: f64::from(self.0),
            });
        }
        Ok(())
    }
}

impl TryFrom<u8> for AssetIndex {
    type Error = ContractViolation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetIndex> for u8 {
    fn from(value: AssetIndex) -> Self {
        value.0
    }
}

/// Scenario -> modality for one session. One image and one audio per role kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityAssignment(BTreeMap<ScenarioId, Modality>);

impl ModalityAssignment {
    pub fn v1(map: BTreeMap<ScenarioId, Modality>) -> Result<Self, ContractViolation> {
        let assignment = Self(map);
        assignment.validate()?;
        Ok(assignment)
    }

    pub fn get(&self, scenario_id: ScenarioId) -> Option<Modality> {
        self.0.get(&scenario_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioId, Modality)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn count(&self, modality: Modality) -> usize {
        self.0.values().filter(|m| **m == modality).count()
    }
}

impl Validate for ModalityAssignment {
    fn validate(&self) -> Result<(), ContractViolation> {
        for kind in RoleKind::ALL {
            let [a, b] = kind.pair();
            match (self.0.get(&a), self.0.get(&b)) {
                (Some(x), Some(y)) if x != y => {}
                (Some(_), Some(_)) => {
                    return Err(ContractViolation::InvalidValue {
                        field: "modality_assignment",
                        reason: "each role-kind pair must have exactly one image and one audio",
                    });
                }
                _ => {
                    return Err(ContractViolation::InvalidValue {
                        field: "modality_assignment",
                        reason: "every scenario must have a modality",
                    });
                }
            }
        }
        if self.0.len() != ScenarioId::ALL.len() {
            return Err(ContractViolation::InvalidValue {
                field: "modality_assignment",
                reason: "must cover exactly the four scenarios",
            });
        }
        Ok(())
    }
}

/// Candidate -> asset index for one scenario in one modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIndexMap {
    pub modality: Modality,
    pub indices: BTreeMap<CandidateId, AssetIndex>,
}

impl CandidateIndexMap {
    pub fn v1(
        modality: Modality,
        indices: BTreeMap<CandidateId, AssetIndex>,
    ) -> Result<Self, ContractViolation> {
        let map = Self { modality, indices };
        map.validate()?;
        Ok(map)
    }

    pub fn get(&self, candidate_id: &CandidateId) -> Option<AssetIndex> {
        self.indices.get(candidate_id).copied()
    }
}

impl Validate for CandidateIndexMap {
    fn validate(&self) -> Result<(), ContractViolation> {
        let mut seen = BTreeSet::new();
        for idx in self.indices.values() {
            idx.validate()?;
            if !idx.fits(self.modality) {
                return Err(ContractViolation::InvalidValue {
                    field: "candidate_index_map.indices",
                    reason: "index outside the modality's range",
                });
            }
            if !seen.insert(*idx) {
                return Err(ContractViolation::InvalidValue {
                    field: "candidate_index_map.indices",
                    reason: "candidates in one scenario must not share an index",
                });
            }
        }
        Ok(())
    }
}

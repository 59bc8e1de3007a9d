#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::validate_token;
use crate::stimulus::Variant;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const PARTICIPANT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);
pub const PARTICIPANT_ID_MAX_LEN: usize = 128;
/// Characters that would split or escape a storage key or file name.
pub const PARTICIPANT_ID_RESERVED: [char; 7] = ['/', '\\', '.', '#', '$', '[', ']'];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractViolation> {
        let raw = raw.into();
        let id = Self(raw.trim().to_string());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ParticipantId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("participant_id", &self.0, PARTICIPANT_ID_MAX_LEN)?;
        if self.0.contains(&PARTICIPANT_ID_RESERVED[..]) {
            return Err(ContractViolation::InvalidValue {
                field: "participant_id",
                reason: "must not contain / \\ . # $ [ ]",
            });
        }
        Ok(())
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ContractViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ParticipantId> for String {
    fn from(value: ParticipantId) -> Self {
        value.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable per-participant number derived from the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantHash(pub u32);

impl ParticipantHash {
    /// Variant used by the fixed-per-participant policy: `hash % 3 + 1`.
    pub fn fixed_variant(self) -> Variant {
        Variant::from_zero_based_mod3(self.0)
    }

    pub fn parity(self) -> u32 {
        self.0 % 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityOrigin {
    External,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub schema_version: SchemaVersion,
    pub id: ParticipantId,
    pub hash: ParticipantHash,
    pub origin: IdentityOrigin,
    /// Present only when the session runs the fixed-per-participant variant policy.
    pub fixed_variant: Option<Variant>,
}

impl Participant {
    pub fn v1(
        id: ParticipantId,
        hash: ParticipantHash,
        origin: IdentityOrigin,
        fixed_variant: Option<Variant>,
    ) -> Result<Self, ContractViolation> {
        let p = Self {
            schema_version: PARTICIPANT_CONTRACT_VERSION,
            id,
            hash,
            origin,
            fixed_variant,
        };
        p.validate()?;
        Ok(p)
    }
}

impl Validate for Participant {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != PARTICIPANT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "participant.schema_version",
                reason: "must match PARTICIPANT_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        if let Some(v) = self.fixed_variant {
            v.validate()?;
            if v != self.hash.fixed_variant() {
                return Err(ContractViolation::InvalidValue {
                    field: "participant.fixed_variant",
                    reason: "must equal hash % 3 + 1",
                });
            }
        }
        Ok(())
    }
}

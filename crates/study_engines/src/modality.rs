#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use study_kernel_contracts::participant::ParticipantHash;
use study_kernel_contracts::scenario::{RoleKind, ScenarioId};
use study_kernel_contracts::stimulus::{Modality, ModalityAssignment};
use study_kernel_contracts::ContractViolation;
use tracing::debug;

use crate::rng::shuffled;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalityStrategy {
    #[default]
    Randomized,
    /// Orientation from `hash % 2`: 0 puts the first scenario of each pair on
    /// images, 1 the second. Reproducible from the participant id alone.
    HashDerived,
}

impl ModalityStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "randomized" | "random" => Some(Self::Randomized),
            "hash_derived" | "hash" => Some(Self::HashDerived),
            _ => None,
        }
    }
}

/// Image/audio split for one role-kind pair: first entry of the returned order is image.
pub fn pick_modality_pair<R: Rng + ?Sized>(
    pair: [ScenarioId; 2],
    strategy: ModalityStrategy,
    hash: ParticipantHash,
    rng: &mut R,
) -> [(ScenarioId, Modality); 2] {
    let [first, second] = pair;
    let image_first = match strategy {
        ModalityStrategy::Randomized => shuffled(&pair, rng)[0] == first,
        ModalityStrategy::HashDerived => hash.parity() == 0,
    };
    if image_first {
        [(first, Modality::Image), (second, Modality::Audio)]
    } else {
        [(second, Modality::Image), (first, Modality::Audio)]
    }
}

/// Balanced assignment for the whole session: one image and one audio per role kind.
pub fn balance_session<R: Rng + ?Sized>(
    strategy: ModalityStrategy,
    hash: ParticipantHash,
    rng: &mut R,
) -> Result<ModalityAssignment, ContractViolation> {
    let mut map = BTreeMap::new();
    for kind in RoleKind::ALL {
        map.extend(pick_modality_pair(kind.pair(), strategy, hash, rng));
    }
    debug!(?strategy, ?map, "modality assignment");
    ModalityAssignment::v1(map)
}

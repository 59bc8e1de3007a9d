#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use study_kernel_contracts::participant::Participant;
use study_kernel_contracts::scenario::{CandidateId, CANDIDATES_PER_SCENARIO};
use study_kernel_contracts::stimulus::{Variant, VARIANT_COUNT};
use study_kernel_contracts::ContractViolation;
use tracing::debug;

use crate::rng::shuffled;

/// How the rendition of each asset is chosen. Exactly one policy is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantPolicy {
    /// `hash % 3 + 1`, reused for every asset the participant sees.
    FixedPerParticipant,
    /// Independent uniform draw for every candidate page.
    #[default]
    UniformPerTrial,
    /// A permutation of 1..=3 laid along each scenario's display order.
    ExactlyOncePerScenario,
}

impl VariantPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fixed_per_participant" | "fixed" => Some(Self::FixedPerParticipant),
            "uniform_per_trial" | "per_trial" | "random" => Some(Self::UniformPerTrial),
            "exactly_once_per_scenario" | "latin" => Some(Self::ExactlyOncePerScenario),
            _ => None,
        }
    }

    pub fn needs_fixed_variant(self) -> bool {
        self == Self::FixedPerParticipant
    }
}

pub fn random_variant<R: Rng + ?Sized>(rng: &mut R) -> Variant {
    Variant::ALL[rng.gen_range(0..usize::from(VARIANT_COUNT))]
}

/// Chooses the variant for every candidate of one scenario.
///
/// `display_order` is the order the candidates will be shown in; the
/// exactly-once policy assigns its permutation along it.
pub fn select_variants<R: Rng + ?Sized>(
    policy: VariantPolicy,
    participant: &Participant,
    display_order: &[CandidateId],
    rng: &mut R,
) -> Result<BTreeMap<CandidateId, Variant>, ContractViolation> {
    let variants: BTreeMap<CandidateId, Variant> = match policy {
        VariantPolicy::FixedPerParticipant => {
            let fixed = participant
                .fixed_variant
                .ok_or(ContractViolation::InvalidValue {
                    field: "participant.fixed_variant",
                    reason: "required by the fixed-per-participant variant policy",
                })?;
            display_order.iter().map(|c| (c.clone(), fixed)).collect()
        }
        VariantPolicy::UniformPerTrial => display_order
            .iter()
            .map(|c| (c.clone(), random_variant(rng)))
            .collect(),
        VariantPolicy::ExactlyOncePerScenario => {
            if display_order.len() != CANDIDATES_PER_SCENARIO {
                return Err(ContractViolation::InvalidValue {
                    field: "variant_selector.display_order",
                    reason: "exactly-once policy needs exactly 3 candidates",
                });
            }
            let perm = shuffled(&Variant::ALL, rng);
            display_order.iter().cloned().zip(perm).collect()
        }
    };
    if variants.len() != display_order.len() {
        return Err(ContractViolation::InvalidValue {
            field: "variant_selector.display_order",
            reason: "candidate ids must be unique",
        });
    }
    debug!(?policy, ?variants, "variants selected");
    Ok(variants)
}

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rand::Rng;
use study_kernel_contracts::scenario::{
    Candidate, CandidateId, ScenarioId, CANDIDATES_PER_SCENARIO,
};
use study_kernel_contracts::stimulus::{AssetIndex, CandidateIndexMap, Modality};
use study_kernel_contracts::ContractViolation;
use thiserror::Error;
use tracing::debug;

use crate::rng::shuffled;

const IMAGE_INDEX_POOL: [u8; CANDIDATES_PER_SCENARIO] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StimulusError {
    #[error("candidate {candidate} has an ordinal outside 1..=3")]
    CandidateOrdinalOutOfRange { candidate: String },
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

pub fn candidate_ordinal(candidate_id: &CandidateId) -> Result<u8, StimulusError> {
    match candidate_id.ordinal() {
        Some(n @ 1..=3) => Ok(n as u8),
        _ => Err(StimulusError::CandidateOrdinalOutOfRange {
            candidate: candidate_id.as_str().to_string(),
        }),
    }
}

/// Voice index for a candidate: first family maps to 1..=3, second to 4..=6.
/// Never random, so a voice stays tied to its scenario+candidate across sessions.
pub fn audio_index_for(
    scenario_id: ScenarioId,
    candidate_id: &CandidateId,
) -> Result<AssetIndex, StimulusError> {
    let ordinal = candidate_ordinal(candidate_id)?;
    let base = scenario_id.family().audio_index_base();
    Ok(AssetIndex::new(base + (ordinal - 1))?)
}

pub fn audio_index_map(
    scenario_id: ScenarioId,
    candidates: &[Candidate],
) -> Result<CandidateIndexMap, StimulusError> {
    let mut indices = BTreeMap::new();
    for c in candidates {
        indices.insert(c.id.clone(), audio_index_for(scenario_id, &c.id)?);
    }
    Ok(CandidateIndexMap::v1(Modality::Audio, indices)?)
}

/// Fresh bijection from the candidates onto faces 1..=3, assigned in list order.
pub fn image_index_map<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rng: &mut R,
) -> Result<CandidateIndexMap, StimulusError> {
    if candidates.len() != CANDIDATES_PER_SCENARIO {
        return Err(StimulusError::Contract(ContractViolation::InvalidValue {
            field: "image_index_map.candidates",
            reason: "must contain exactly 3 candidates",
        }));
    }
    let pool = shuffled(&IMAGE_INDEX_POOL, rng);
    let mut indices = BTreeMap::new();
    for (c, idx) in candidates.iter().zip(pool) {
        indices.insert(c.id.clone(), AssetIndex::new(idx)?);
    }
    Ok(CandidateIndexMap::v1(Modality::Image, indices)?)
}

pub fn assign_indices<R: Rng + ?Sized>(
    scenario_id: ScenarioId,
    candidates: &[Candidate],
    modality: Modality,
    rng: &mut R,
) -> Result<CandidateIndexMap, StimulusError> {
    let map = match modality {
        Modality::Image => image_index_map(candidates, rng)?,
        Modality::Audio => audio_index_map(scenario_id, candidates)?,
    };
    debug!(scenario = %scenario_id, modality = modality.as_str(), indices = ?map.indices, "asset indices assigned");
    Ok(map)
}

#![forbid(unsafe_code)]

use rand::Rng;
use serde::Serialize;
use study_engines::asset_path::AssetResolver;
use study_engines::modality::balance_session;
use study_engines::identity::resolve_participant;
use study_engines::rng::shuffled;
use study_kernel_contracts::participant::Participant;
use study_kernel_contracts::scenario::ScenarioId;
use study_kernel_contracts::stimulus::ModalityAssignment;
use study_kernel_contracts::Validate;
use tracing::info;

use crate::config::StudyConfig;
use crate::sequence::SequenceError;

/// Per-participant decisions made once at session start and read by every later stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfiguration {
    pub config: StudyConfig,
    pub participant: Participant,
    pub modality: ModalityAssignment,
    pub scenario_order: Vec<ScenarioId>,
}

impl SessionConfiguration {
    pub fn establish<R: Rng + ?Sized>(
        config: StudyConfig,
        external_participant_id: Option<&str>,
        rng: &mut R,
    ) -> Result<Self, SequenceError> {
        config.validate()?;
        let seed_generator = config.seed_algorithm.generator();
        let participant = resolve_participant(
            external_participant_id,
            seed_generator.as_ref(),
            config.variant_policy.needs_fixed_variant(),
            rng,
        )?;
        let modality = balance_session(config.modality_strategy, participant.hash, rng)?;
        let scenario_order = if config.randomize_scenario_order {
            shuffled(&ScenarioId::ALL, rng)
        } else {
            ScenarioId::ALL.to_vec()
        };
        info!(
            participant_id = %participant.id,
            origin = ?participant.origin,
            order = ?scenario_order,
            "session configuration established"
        );
        Ok(Self {
            config,
            participant,
            modality,
            scenario_order,
        })
    }

    pub fn asset_resolver(&self) -> AssetResolver {
        AssetResolver::new(self.config.asset_root.clone())
    }
}

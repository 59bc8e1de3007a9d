#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;
use study_engines::asset_path::AssetResolver;
use study_engines::content;
use study_engines::rng::{ordinal_word, shuffled};
use study_engines::stimulus_index::{assign_indices, StimulusError};
use study_engines::variant::select_variants;
use study_kernel_contracts::participant::ParticipantId;
use study_kernel_contracts::scenario::{CandidateId, Scenario, ScenarioId, CANDIDATES_PER_SCENARIO};
use study_kernel_contracts::stimulus::{CandidateIndexMap, Modality, Variant};
use study_kernel_contracts::timeline::{
    AdvanceInput, CandidateRatingBody, CandidateUnitContext, PresentationUnit, UnitBody, UnitId,
    RATING_SCALE_LABELS,
};
use study_kernel_contracts::{ContractViolation, Validate};
use thiserror::Error;
use tracing::{debug, info};

use crate::preload::PreloadManifest;
use crate::session::SessionConfiguration;

const SPACE: char = ' ';

/// Configuration defects found while composing the timeline. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error("candidate {candidate} has an ordinal outside 1..=3")]
    CandidateOrdinalOutOfRange { candidate: String },
    #[error("scenario {scenario} has {got} candidates, needs 3")]
    TooFewCandidates { scenario: ScenarioId, got: usize },
    #[error("no asset index for candidate {candidate} in scenario {scenario}")]
    MissingAssetIndex { scenario: ScenarioId, candidate: String },
    #[error("no variant for candidate {candidate} in scenario {scenario}")]
    MissingVariant { scenario: ScenarioId, candidate: String },
    #[error("scenario {scenario} has no modality assigned")]
    MissingModality { scenario: ScenarioId },
}

impl From<StimulusError> for SequenceError {
    fn from(e: StimulusError) -> Self {
        match e {
            StimulusError::CandidateOrdinalOutOfRange { candidate } => {
                SequenceError::CandidateOrdinalOutOfRange { candidate }
            }
            StimulusError::Contract(v) => SequenceError::Contract(v),
        }
    }
}

/// Stimulus decisions for one scenario, fixed before any unit is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioPlan {
    pub scenario: Scenario,
    pub modality: Modality,
    pub indices: CandidateIndexMap,
    pub display_order: Vec<CandidateId>,
    pub variants: BTreeMap<CandidateId, Variant>,
}

/// Index mapping is drawn over the candidate list before the display order is
/// shuffled; variants follow the display order.
pub fn plan_scenario<R: Rng + ?Sized>(
    session: &SessionConfiguration,
    scenario: &Scenario,
    rng: &mut R,
) -> Result<ScenarioPlan, SequenceError> {
    if scenario.candidates.len() < CANDIDATES_PER_SCENARIO {
        return Err(SequenceError::TooFewCandidates {
            scenario: scenario.id,
            got: scenario.candidates.len(),
        });
    }
    scenario.validate()?;
    let modality = session
        .modality
        .get(scenario.id)
        .ok_or(SequenceError::MissingModality { scenario: scenario.id })?;
    let indices = assign_indices(scenario.id, &scenario.candidates, modality, rng)?;

    let listed: Vec<CandidateId> = scenario.candidates.iter().map(|c| c.id.clone()).collect();
    let display_order = if session.config.randomize_display_order {
        shuffled(&listed, rng)
    } else {
        listed
    };
    let variants = select_variants(
        session.config.variant_policy,
        &session.participant,
        &display_order,
        rng,
    )?;
    debug!(scenario = %scenario.id, ?display_order, "scenario planned");
    Ok(ScenarioPlan {
        scenario: scenario.clone(),
        modality,
        indices,
        display_order,
        variants,
    })
}

/// Ordered units for the whole session plus the plans they were built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionTimeline {
    pub participant_id: ParticipantId,
    pub plans: Vec<ScenarioPlan>,
    pub units: Vec<PresentationUnit>,
}

impl SessionTimeline {
    pub fn rating_units(&self) -> impl Iterator<Item = &PresentationUnit> + '_ {
        self.units
            .iter()
            .filter(|u| matches!(u.body, UnitBody::CandidateRating(_)))
    }
}

struct UnitSink {
    units: Vec<PresentationUnit>,
}

impl UnitSink {
    fn push(&mut self, advance: AdvanceInput, body: UnitBody) -> Result<(), ContractViolation> {
        let unit = PresentationUnit {
            unit_id: UnitId(self.units.len() as u32),
            advance,
            body,
        };
        unit.validate()?;
        self.units.push(unit);
        Ok(())
    }
}

fn push_scenario_units(
    sink: &mut UnitSink,
    session: &SessionConfiguration,
    resolver: &AssetResolver,
    plan: &ScenarioPlan,
    ordinal: u8,
) -> Result<(), SequenceError> {
    let scenario = &plan.scenario;
    let cfg = &session.config;

    if cfg.include_announcements {
        sink.push(
            AdvanceInput::Key { key: SPACE },
            UnitBody::Announcement {
                scenario_id: scenario.id,
                ordinal,
                ordinal_word: ordinal_word(ordinal),
            },
        )?;
    }
    sink.push(
        AdvanceInput::Key { key: SPACE },
        UnitBody::Preface {
            scenario_id: scenario.id,
            scenario_kind: scenario.kind(),
            modality: plan.modality,
            title: scenario.title.clone(),
            text: scenario.text.clone(),
        },
    )?;

    let gender = scenario.kind().gender();
    let audio_gated = plan.modality == Modality::Audio && cfg.audio.gates_audio();
    for (pos, candidate_id) in plan.display_order.iter().enumerate() {
        let candidate = scenario
            .candidates
            .iter()
            .find(|c| &c.id == candidate_id)
            .ok_or(ContractViolation::InvalidValue {
                field: "scenario_plan.display_order",
                reason: "must only name the scenario's candidates",
            })?;
        let asset_index = plan
            .indices
            .get(candidate_id)
            .ok_or_else(|| SequenceError::MissingAssetIndex {
                scenario: scenario.id,
                candidate: candidate_id.to_string(),
            })?;
        let variant = plan
            .variants
            .get(candidate_id)
            .copied()
            .ok_or_else(|| SequenceError::MissingVariant {
                scenario: scenario.id,
                candidate: candidate_id.to_string(),
            })?;

        if pos > 0 && cfg.fixation_enabled {
            sink.push(
                AdvanceInput::Timer {
                    duration_ms: cfg.fixation_ms,
                },
                UnitBody::Fixation {
                    scenario_id: scenario.id,
                    duration_ms: cfg.fixation_ms,
                },
            )?;
        }

        let context = CandidateUnitContext {
            scenario_id: scenario.id,
            scenario_kind: scenario.kind(),
            scenario_ordinal: ordinal,
            candidate_id: candidate_id.clone(),
            display_position: (pos + 1) as u8,
            modality: plan.modality,
            asset_index,
            variant,
            asset_path: resolver.resolve(plan.modality, gender, asset_index, variant),
            question_key: CandidateUnitContext::question_key_for(
                scenario.id,
                plan.modality,
                candidate_id,
            ),
        };
        let body = CandidateRatingBody {
            context,
            scenario_title: scenario.title.clone(),
            scenario_text: scenario.text.clone(),
            candidate_name: candidate.name.clone(),
            candidate_bio: candidate.bio.clone(),
            prompt: content::RATING_PROMPT.to_string(),
            scale_labels: RATING_SCALE_LABELS.iter().map(|s| s.to_string()).collect(),
            gate_hint: if audio_gated {
                cfg.audio.hint_text()
            } else {
                None
            },
            transcript_note: (plan.modality == Modality::Audio)
                .then(|| content::AUDIO_TRANSCRIPT_NOTE.to_string()),
        };
        sink.push(
            AdvanceInput::ContinueButton,
            UnitBody::CandidateRating(Box::new(body)),
        )?;
    }
    Ok(())
}

/// Builds the complete linear unit list: welcome, instructions, preload,
/// the four scenarios in session order, closing.
pub fn build_session_timeline<R: Rng + ?Sized>(
    session: &SessionConfiguration,
    rng: &mut R,
) -> Result<SessionTimeline, SequenceError> {
    let scenarios: Vec<Scenario> = session
        .scenario_order
        .iter()
        .map(|id| content::scenario(*id))
        .collect();
    build_timeline_for(session, &scenarios, rng)
}

/// Same as [`build_session_timeline`] over caller-supplied scenario content.
pub fn build_timeline_for<R: Rng + ?Sized>(
    session: &SessionConfiguration,
    scenarios: &[Scenario],
    rng: &mut R,
) -> Result<SessionTimeline, SequenceError> {
    let mut plans = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        plans.push(plan_scenario(session, scenario, rng)?);
    }

    let resolver = session.asset_resolver();
    let manifest = PreloadManifest::for_session(&resolver, &session.modality);
    let mut sink = UnitSink { units: Vec::new() };
    sink.push(
        AdvanceInput::Key { key: SPACE },
        UnitBody::Welcome {
            heading: content::WELCOME_HEADING.to_string(),
            paragraphs: content::WELCOME_PARAGRAPHS.iter().map(|p| p.to_string()).collect(),
        },
    )?;
    sink.push(
        AdvanceInput::NavigationButton,
        UnitBody::Instructions {
            pages: content::INSTRUCTION_PAGES.iter().map(|p| p.to_string()).collect(),
        },
    )?;
    sink.push(
        AdvanceInput::Automatic,
        UnitBody::Preload {
            images: manifest.images,
            audio: manifest.audio,
        },
    )?;
    for (i, plan) in plans.iter().enumerate() {
        push_scenario_units(&mut sink, session, &resolver, plan, (i + 1) as u8)?;
    }
    sink.push(
        AdvanceInput::Key { key: SPACE },
        UnitBody::Closing {
            heading: content::CLOSING_HEADING.to_string(),
            message: content::CLOSING_MESSAGE.to_string(),
        },
    )?;

    info!(
        participant_id = %session.participant.id,
        units = sink.units.len(),
        scenarios = plans.len(),
        "session timeline built"
    );
    Ok(SessionTimeline {
        participant_id: session.participant.id.clone(),
        plans,
        units: sink.units,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyConfig;
    use study_engines::rng::session_rng;
    use study_engines::variant::VariantPolicy;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use study_kernel_contracts::scenario::{Candidate, RoleKind};

    fn session(cfg: StudyConfig) -> SessionConfiguration {
        SessionConfiguration::establish(cfg, Some("P77"), &mut session_rng(Some(3))).unwrap()
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: CandidateId::new(id).unwrap(),
            name: format!("Name {id}"),
            bio: "Bio.".to_string(),
        }
    }

    #[test]
    fn at_sequence_01_scenario_layout_with_fixation_between_candidates() {
        let s = session(StudyConfig::pilot_v1());
        let t = build_session_timeline(&s, &mut session_rng(Some(4))).unwrap();
        let kinds: Vec<&str> = t.units.iter().map(|u| u.body.trial_type()).collect();
        assert_eq!(&kinds[..3], &["welcome", "instructions", "preload"]);
        assert_eq!(kinds.last(), Some(&"closing"));
        // announce, preface, rating, ISI, rating, ISI, rating
        assert_eq!(kinds[3], "scenario_announce");
        assert_eq!(kinds[4], "preface");
        assert_eq!(kinds[6], "candidate_ISI");
        assert_eq!(kinds[8], "candidate_ISI");
        assert_eq!(t.units.len(), 3 + 4 * 7 + 1);
        assert_eq!(t.rating_units().count(), 12);
        for (i, u) in t.units.iter().enumerate() {
            assert_eq!(u.unit_id, UnitId(i as u32));
        }
    }

    #[test]
    fn at_sequence_02_optional_units_can_be_switched_off() {
        let mut cfg = StudyConfig::pilot_v1();
        cfg.include_announcements = false;
        cfg.fixation_enabled = false;
        let t = build_session_timeline(&session(cfg), &mut session_rng(Some(4))).unwrap();
        assert_eq!(t.units.len(), 3 + 4 * 4 + 1);
    }

    #[test]
    fn at_sequence_03_display_shuffle_does_not_move_indices_or_variants() {
        let s = session(StudyConfig::pilot_v1());
        let t = build_session_timeline(&s, &mut session_rng(Some(11))).unwrap();
        for u in t.rating_units() {
            let ctx = u.body.candidate_context().unwrap();
            let plan = t.plans.iter().find(|p| p.scenario.id == ctx.scenario_id).unwrap();
            assert_eq!(plan.indices.get(&ctx.candidate_id), Some(ctx.asset_index));
            assert_eq!(plan.variants.get(&ctx.candidate_id), Some(&ctx.variant));
            assert_eq!(
                plan.display_order[usize::from(ctx.display_position) - 1],
                ctx.candidate_id
            );
        }
    }

    #[test]
    fn at_sequence_04_announcements_count_scenarios_in_session_order() {
        let s = session(StudyConfig::pilot_v1());
        let t = build_session_timeline(&s, &mut session_rng(Some(5))).unwrap();
        let announced: Vec<(ScenarioId, u8, String)> = t
            .units
            .iter()
            .filter_map(|u| match &u.body {
                UnitBody::Announcement {
                    scenario_id,
                    ordinal,
                    ordinal_word,
                } => Some((*scenario_id, *ordinal, ordinal_word.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(announced.len(), 4);
        for (i, (id, ord, word)) in announced.iter().enumerate() {
            assert_eq!(*id, s.scenario_order[i]);
            assert_eq!(usize::from(*ord), i + 1);
            assert!(!word.is_empty());
        }
    }

    #[test]
    fn at_sequence_05_audio_units_carry_gate_hint_and_transcript_note() {
        let s = session(StudyConfig::pilot_v1());
        let t = build_session_timeline(&s, &mut session_rng(Some(6))).unwrap();
        for u in t.rating_units() {
            let UnitBody::CandidateRating(body) = &u.body else {
                unreachable!()
            };
            match body.context.modality {
                Modality::Audio => {
                    assert!(body.gate_hint.is_some());
                    assert!(body.transcript_note.is_some());
                    assert!(body.context.asset_path.ends_with(".wav"));
                }
                Modality::Image => {
                    assert!(body.gate_hint.is_none());
                    assert!(body.context.asset_path.ends_with(".png"));
                }
            }
        }
    }

    #[test]
    fn at_sequence_06_too_few_candidates_aborts() {
        let s = session(StudyConfig::pilot_v1());
        let mut short = content::scenario(ScenarioId::CeoA);
        short.candidates.truncate(2);
        let err = build_timeline_for(&s, &[short], &mut session_rng(Some(1))).unwrap_err();
        assert_eq!(
            err,
            SequenceError::TooFewCandidates {
                scenario: ScenarioId::CeoA,
                got: 2
            }
        );
    }

    #[test]
    fn at_sequence_07_bad_candidate_ordinal_aborts_for_audio_scenarios() {
        let s = session(StudyConfig::pilot_v1());
        let audio_scenario = ScenarioId::ALL
            .into_iter()
            .find(|id| s.modality.get(*id) == Some(Modality::Audio))
            .unwrap();
        let mut bad = content::scenario(audio_scenario);
        bad.candidates = vec![candidate("C1"), candidate("C2"), candidate("C9")];
        let err = build_timeline_for(&s, &[bad], &mut session_rng(Some(1))).unwrap_err();
        assert_eq!(
            err,
            SequenceError::CandidateOrdinalOutOfRange {
                candidate: "C9".to_string()
            }
        );
    }

    #[test]
    fn at_sequence_08_exactly_once_policy_holds_per_scenario() {
        let mut cfg = StudyConfig::pilot_v1();
        cfg.variant_policy = VariantPolicy::ExactlyOncePerScenario;
        let s = session(cfg);
        let t = build_session_timeline(&s, &mut session_rng(Some(8))).unwrap();
        for plan in &t.plans {
            let mut used: Vec<u8> = plan.variants.values().map(|v| v.get()).collect();
            used.sort_unstable();
            assert_eq!(used, vec![1, 2, 3]);
        }
    }

    #[test]
    fn at_sequence_10_scenario_screens_advance_on_space() {
        let s = session(StudyConfig::pilot_v1());
        let t = build_session_timeline(&s, &mut session_rng(Some(12))).unwrap();
        let mut prefaces = 0;
        for u in &t.units {
            match &u.body {
                UnitBody::Preface { .. } | UnitBody::Announcement { .. } => {
                    assert_eq!(u.advance, AdvanceInput::Key { key: ' ' });
                    prefaces += usize::from(matches!(u.body, UnitBody::Preface { .. }));
                }
                UnitBody::CandidateRating(_) => assert_eq!(u.advance, AdvanceInput::ContinueButton),
                _ => {}
            }
        }
        assert_eq!(prefaces, 4);
    }

    proptest! {
        #[test]
        fn at_sequence_09_each_role_kind_sees_both_modalities(seed in any::<u64>()) {
            let mut rng = session_rng(Some(seed));
            let s = SessionConfiguration::establish(StudyConfig::pilot_v1(), None, &mut rng).unwrap();
            let t = build_session_timeline(&s, &mut rng).unwrap();
            for kind in RoleKind::ALL {
                let seen: BTreeSet<Modality> = t
                    .rating_units()
                    .filter_map(|u| u.body.candidate_context())
                    .filter(|c| c.scenario_kind == kind)
                    .map(|c| c.modality)
                    .collect();
                prop_assert_eq!(seen.len(), 2);
            }
            prop_assert_eq!(t.rating_units().count(), 12);
        }
    }
}

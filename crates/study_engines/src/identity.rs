#![forbid(unsafe_code)]

use rand::Rng;
use study_kernel_contracts::participant::{IdentityOrigin, Participant, ParticipantId};
use study_kernel_contracts::ContractViolation;
use tracing::debug;

use crate::seed::SeedGenerator;

pub const PARTICIPANT_QUERY_PARAM: &str = "PID";
const GENERATED_ID_SPACE: u32 = 1_000_000_000;

/// Reads the participant identifier from a query string such as `?PID=abc&src=x`.
/// Empty values count as absent.
pub fn participant_id_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == PARTICIPANT_QUERY_PARAM)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn generate_participant_id<R: Rng + ?Sized>(
    rng: &mut R,
) -> Result<ParticipantId, ContractViolation> {
    let n = rng.gen_range(0..GENERATED_ID_SPACE);
    ParticipantId::new(format!("P{n}"))
}

/// Resolves the session's participant once at startup.
///
/// An externally supplied identifier wins; otherwise one is generated. The
/// fixed variant is derived only when the active variant policy needs it.
pub fn resolve_participant<R: Rng + ?Sized>(
    external: Option<&str>,
    seed_generator: &dyn SeedGenerator,
    derive_fixed_variant: bool,
    rng: &mut R,
) -> Result<Participant, ContractViolation> {
    let (id, origin) = match external.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => (ParticipantId::new(raw)?, IdentityOrigin::External),
        None => (generate_participant_id(rng)?, IdentityOrigin::Generated),
    };
    let hash = seed_generator.participant_hash(&id);
    let fixed_variant = derive_fixed_variant.then(|| hash.fixed_variant());
    debug!(participant_id = %id, hash = hash.0, ?origin, ?fixed_variant, "participant resolved");
    Participant::v1(id, hash, origin, fixed_variant)
}

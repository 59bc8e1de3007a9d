#![forbid(unsafe_code)]

pub mod config;
pub mod preload;
pub mod runner;
pub mod sequence;
pub mod session;

use study_engines::rng::session_rng;

use crate::config::StudyConfig;
use crate::runner::SessionRunner;
use crate::sequence::{build_session_timeline, SequenceError, SessionTimeline};
use crate::session::SessionConfiguration;

/// Establishes the session and composes its timeline from one session RNG,
/// seeded from `config.rng_seed` when present.
pub fn prepare_session(
    config: StudyConfig,
    external_participant_id: Option<&str>,
) -> Result<(SessionConfiguration, SessionTimeline), SequenceError> {
    let mut rng = session_rng(config.rng_seed);
    let session = SessionConfiguration::establish(config, external_participant_id, &mut rng)?;
    let timeline = build_session_timeline(&session, &mut rng)?;
    Ok((session, timeline))
}

pub fn start_runner(
    config: StudyConfig,
    external_participant_id: Option<&str>,
) -> Result<(SessionConfiguration, SessionRunner), SequenceError> {
    let (session, timeline) = prepare_session(config, external_participant_id)?;
    let runner = SessionRunner::new(timeline, session.config.audio);
    Ok((session, runner))
}

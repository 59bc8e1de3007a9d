#![forbid(unsafe_code)]

use rand::Rng;
use study_engines::audio_gate::MediaEvent;
use study_engines::response::RawResponse;
use study_kernel_contracts::gate::AudioGateMode;
use study_os::runner::SessionRunner;
use tracing::debug;

use crate::error::{Result, ToolError};

const PLAYBACK_STEP_S: f64 = 0.25;
const MAX_PLAYBACK_STEPS: u32 = 100_000;

/// Feeds the active gate playback signals until it unlocks.
fn satisfy_gate(runner: &mut SessionRunner, mode: AudioGateMode) -> Result<()> {
    match mode {
        AudioGateMode::Free => {}
        AudioGateMode::MustPlayFull => {
            runner.on_media_event(MediaEvent::TimeUpdate { position_s: 0.0 });
            runner.on_media_event(MediaEvent::Ended);
        }
        AudioGateMode::MinSeconds => {
            let mut position_s = 0.0;
            for _ in 0..MAX_PLAYBACK_STEPS {
                if !runner.gate().is_some_and(|g| g.is_locked()) {
                    break;
                }
                runner.on_media_event(MediaEvent::TimeUpdate { position_s });
                position_s += PLAYBACK_STEP_S;
            }
        }
    }
    if runner.gate().is_some_and(|g| g.is_locked()) {
        return Err(ToolError::invalid("simulated playback could not unlock the audio gate"));
    }
    Ok(())
}

/// Runs every unit with random valid answers. Returns the number of ratings recorded.
pub fn play_session<R: Rng + ?Sized>(
    runner: &mut SessionRunner,
    mode: AudioGateMode,
    rng: &mut R,
) -> Result<usize> {
    let mut ratings = 0;
    while !runner.is_finished() {
        let Some(activation) = runner.activate_current() else {
            break;
        };
        let question_key = activation
            .unit
            .body
            .candidate_context()
            .map(|c| c.question_key.clone());
        let locked = activation.gate.is_some_and(|g| g.is_locked());
        if locked {
            satisfy_gate(runner, mode)?;
        }
        let raw = question_key.map(|key| {
            RawResponse::answer(&key, rng.gen_range(0..=6), Some(rng.gen_range(800..12_000)))
        });
        if let Some(record) = runner.complete_current(raw.as_ref())? {
            debug!(candidate = %record.candidate_id, rating = ?record.rating, "simulated rating");
            ratings += 1;
        }
    }
    Ok(ratings)
}

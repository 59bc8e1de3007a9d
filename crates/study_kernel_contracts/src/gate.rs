#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::validate_finite_non_negative;
use crate::{ContractViolation, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioGateMode {
    MustPlayFull,
    MinSeconds,
    Free,
}

impl AudioGateMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "must_play_full" => Some(Self::MustPlayFull),
            "min_seconds" => Some(Self::MinSeconds),
            "free" => Some(Self::Free),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioPresentationPolicy {
    pub mode: AudioGateMode,
    /// Cumulative listening time required in `MinSeconds` mode.
    pub min_seconds: f64,
    pub block_seeking: bool,
    /// Forward slack past the furthest heard position before a seek is clamped.
    pub seek_tolerance_s: f64,
    pub show_gate_hint: bool,
}

impl AudioPresentationPolicy {
    pub fn pilot_v1() -> Self {
        Self {
            mode: AudioGateMode::MustPlayFull,
            min_seconds: 6.0,
            block_seeking: true,
            seek_tolerance_s: 0.25,
            show_gate_hint: true,
        }
    }

    pub fn gates_audio(&self) -> bool {
        self.mode != AudioGateMode::Free
    }

    /// Participant-facing unlock condition, `None` when no hint is shown.
    pub fn hint_text(&self) -> Option<String> {
        if !self.show_gate_hint {
            return None;
        }
        match self.mode {
            AudioGateMode::Free => None,
            AudioGateMode::MustPlayFull => Some(
                "Please listen to the audio until it finishes to enable the rating.".to_string(),
            ),
            AudioGateMode::MinSeconds => Some(format!(
                "Please listen to the audio for at least {} seconds to enable the rating.",
                self.min_seconds
            )),
        }
    }
}

impl Validate for AudioPresentationPolicy {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_finite_non_negative("audio_presentation_policy.min_seconds", self.min_seconds)?;
        validate_finite_non_negative(
            "audio_presentation_policy.seek_tolerance_s",
            self.seek_tolerance_s,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Locked,
    Unlocked,
}

/// What the presentation runtime should apply to the rating and continue controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlState {
    pub rating_enabled: bool,
    pub continue_enabled: bool,
    pub de_emphasized: bool,
    pub hint_visible: bool,
}

impl ControlState {
    pub fn locked(hint_visible: bool) -> Self {
        Self {
            rating_enabled: false,
            continue_enabled: false,
            de_emphasized: true,
            hint_visible,
        }
    }

    pub fn unlocked() -> Self {
        Self {
            rating_enabled: true,
            continue_enabled: true,
            de_emphasized: false,
            hint_visible: false,
        }
    }
}

#![forbid(unsafe_code)]

//! Per-unit gate that keeps the rating controls locked until the participant
//! has listened enough, and optionally blocks skipping ahead.
//!
//! The gate lives exactly as long as one rating unit. It never relocks once
//! unlocked.

use serde::{Deserialize, Serialize};
use study_kernel_contracts::gate::{AudioGateMode, AudioPresentationPolicy, ControlState, GateState};
use study_kernel_contracts::stimulus::Modality;
use study_kernel_contracts::ReasonCodeId;
use tracing::debug;

pub mod reason_codes {
    use study_kernel_contracts::ReasonCodeId;

    pub const GATE_LOCKED_ON_ACTIVATE: ReasonCodeId = ReasonCodeId(0x4147_0001);
    pub const GATE_BYPASSED: ReasonCodeId = ReasonCodeId(0x4147_0002);
    pub const GATE_UNLOCK_ENDED: ReasonCodeId = ReasonCodeId(0x4147_0003);
    pub const GATE_UNLOCK_MIN_SECONDS: ReasonCodeId = ReasonCodeId(0x4147_0004);
    pub const GATE_SEEK_CLAMPED: ReasonCodeId = ReasonCodeId(0x4147_0005);
}

/// Signals from the playing media element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    TimeUpdate { position_s: f64 },
    Ended,
    Seeking { position_s: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum GateOutput {
    NoChange,
    Unlocked {
        controls: ControlState,
        reason_code: ReasonCodeId,
    },
    /// The runtime must move the playhead back to `position_s`.
    SeekClamped {
        position_s: f64,
        reason_code: ReasonCodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioGate {
    policy: AudioPresentationPolicy,
    gated: bool,
    state: GateState,
    max_position_s: f64,
    listened_s: f64,
    last_position_s: Option<f64>,
    activation_reason: ReasonCodeId,
}

impl AudioGate {
    /// Enters `Locked` for audio units under a gating mode, `Unlocked` otherwise.
    pub fn activate(policy: AudioPresentationPolicy, modality: Modality) -> Self {
        let gated = modality == Modality::Audio && policy.gates_audio();
        let (state, activation_reason) = if gated {
            (GateState::Locked, reason_codes::GATE_LOCKED_ON_ACTIVATE)
        } else {
            (GateState::Unlocked, reason_codes::GATE_BYPASSED)
        };
        debug!(?state, mode = ?policy.mode, ?modality, "audio gate activated");
        Self {
            policy,
            gated,
            state,
            max_position_s: 0.0,
            listened_s: 0.0,
            last_position_s: None,
            activation_reason,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == GateState::Locked
    }

    pub fn activation_reason(&self) -> ReasonCodeId {
        self.activation_reason
    }

    pub fn controls(&self) -> ControlState {
        match self.state {
            GateState::Locked => ControlState::locked(self.policy.show_gate_hint),
            GateState::Unlocked => ControlState::unlocked(),
        }
    }

    pub fn max_position_s(&self) -> f64 {
        self.max_position_s
    }

    pub fn listened_s(&self) -> f64 {
        self.listened_s
    }

    pub fn handle(&mut self, event: MediaEvent) -> GateOutput {
        match event {
            MediaEvent::TimeUpdate { position_s } => self.on_time_update(position_s),
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Seeking { position_s } => self.on_seeking(position_s),
        }
    }

    pub fn on_time_update(&mut self, position_s: f64) -> GateOutput {
        if !self.gated || !position_s.is_finite() || position_s < 0.0 {
            return GateOutput::NoChange;
        }
        if position_s > self.max_position_s {
            self.max_position_s = position_s;
        }
        if let Some(last) = self.last_position_s {
            if position_s > last {
                self.listened_s += position_s - last;
            }
        }
        self.last_position_s = Some(position_s);

        if self.policy.mode == AudioGateMode::MinSeconds
            && self.listened_s >= self.policy.min_seconds
        {
            return self.unlock(reason_codes::GATE_UNLOCK_MIN_SECONDS);
        }
        GateOutput::NoChange
    }

    pub fn on_ended(&mut self) -> GateOutput {
        if !self.gated {
            return GateOutput::NoChange;
        }
        if self.policy.mode == AudioGateMode::MustPlayFull {
            return self.unlock(reason_codes::GATE_UNLOCK_ENDED);
        }
        GateOutput::NoChange
    }

    /// Clamps forward seeks past `max heard + tolerance`; rewinding is always allowed.
    pub fn on_seeking(&mut self, position_s: f64) -> GateOutput {
        if !self.gated || !position_s.is_finite() {
            return GateOutput::NoChange;
        }
        let allowed = (self.max_position_s + self.policy.seek_tolerance_s).max(0.0);
        if self.policy.block_seeking && position_s > allowed {
            self.last_position_s = Some(allowed);
            debug!(requested = position_s, clamped_to = allowed, "seek clamped");
            return GateOutput::SeekClamped {
                position_s: allowed,
                reason_code: reason_codes::GATE_SEEK_CLAMPED,
            };
        }
        self.last_position_s = Some(position_s.max(0.0));
        GateOutput::NoChange
    }

    fn unlock(&mut self, reason_code: ReasonCodeId) -> GateOutput {
        if self.state == GateState::Unlocked {
            return GateOutput::NoChange;
        }
        self.state = GateState::Unlocked;
        debug!(reason_code = reason_code.0, listened_s = self.listened_s, "audio gate unlocked");
        GateOutput::Unlocked {
            controls: ControlState::unlocked(),
            reason_code,
        }
    }
}

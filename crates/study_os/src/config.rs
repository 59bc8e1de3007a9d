#![forbid(unsafe_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};
use study_engines::asset_path::DEFAULT_ASSET_ROOT;
use study_engines::modality::ModalityStrategy;
use study_engines::seed::SeedAlgorithm;
use study_engines::variant::VariantPolicy;
use study_kernel_contracts::gate::{AudioGateMode, AudioPresentationPolicy};
use study_kernel_contracts::{ContractViolation, Validate};
use thiserror::Error;
use tracing::warn;

pub const ENV_VARIANT_POLICY: &str = "STUDY_VARIANT_POLICY";
pub const ENV_MODALITY_STRATEGY: &str = "STUDY_MODALITY_STRATEGY";
pub const ENV_AUDIO_MODE: &str = "STUDY_AUDIO_MODE";
pub const ENV_AUDIO_MIN_SECONDS: &str = "STUDY_AUDIO_MIN_SECONDS";
pub const ENV_BLOCK_SEEKING: &str = "STUDY_BLOCK_SEEKING";
pub const ENV_RANDOMIZE_DISPLAY_ORDER: &str = "STUDY_RANDOMIZE_DISPLAY_ORDER";
pub const ENV_RANDOMIZE_SCENARIO_ORDER: &str = "STUDY_RANDOMIZE_SCENARIO_ORDER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// Study-wide knobs. One instance is fixed before the first participant session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub variant_policy: VariantPolicy,
    pub modality_strategy: ModalityStrategy,
    pub seed_algorithm: SeedAlgorithm,
    pub randomize_scenario_order: bool,
    pub randomize_display_order: bool,
    pub include_announcements: bool,
    pub fixation_enabled: bool,
    pub fixation_ms: u32,
    pub audio: AudioPresentationPolicy,
    pub asset_root: String,
    pub rng_seed: Option<u64>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self::pilot_v1()
    }
}

impl StudyConfig {
    pub fn pilot_v1() -> Self {
        Self {
            variant_policy: VariantPolicy::UniformPerTrial,
            modality_strategy: ModalityStrategy::Randomized,
            seed_algorithm: SeedAlgorithm::Rolling31,
            randomize_scenario_order: true,
            randomize_display_order: true,
            include_announcements: true,
            fixation_enabled: true,
            fixation_ms: 1000,
            audio: AudioPresentationPolicy::pilot_v1(),
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            rng_seed: None,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        let cfg: Self = serde_json::from_slice(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`. Unparseable values are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = read(ENV_VARIANT_POLICY) {
            match VariantPolicy::parse(&raw) {
                Some(p) => self.variant_policy = p,
                None => ignored(ENV_VARIANT_POLICY, &raw),
            }
        }
        if let Some(raw) = read(ENV_MODALITY_STRATEGY) {
            match ModalityStrategy::parse(&raw) {
                Some(s) => self.modality_strategy = s,
                None => ignored(ENV_MODALITY_STRATEGY, &raw),
            }
        }
        if let Some(raw) = read(ENV_AUDIO_MODE) {
            match AudioGateMode::parse(&raw) {
                Some(m) => self.audio.mode = m,
                None => ignored(ENV_AUDIO_MODE, &raw),
            }
        }
        if let Some(raw) = read(ENV_AUDIO_MIN_SECONDS) {
            match raw.parse::<f64>() {
                Ok(s) if s.is_finite() && s >= 0.0 => self.audio.min_seconds = s,
                _ => ignored(ENV_AUDIO_MIN_SECONDS, &raw),
            }
        }
        if let Some(raw) = read(ENV_BLOCK_SEEKING) {
            match parse_bool(&raw) {
                Some(b) => self.audio.block_seeking = b,
                None => ignored(ENV_BLOCK_SEEKING, &raw),
            }
        }
        if let Some(raw) = read(ENV_RANDOMIZE_DISPLAY_ORDER) {
            match parse_bool(&raw) {
                Some(b) => self.randomize_display_order = b,
                None => ignored(ENV_RANDOMIZE_DISPLAY_ORDER, &raw),
            }
        }
        if let Some(raw) = read(ENV_RANDOMIZE_SCENARIO_ORDER) {
            match parse_bool(&raw) {
                Some(b) => self.randomize_scenario_order = b,
                None => ignored(ENV_RANDOMIZE_SCENARIO_ORDER, &raw),
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn ignored(name: &str, raw: &str) {
    warn!(variable = name, value = raw, "ignoring unparseable override");
}

impl Validate for StudyConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.audio.validate()?;
        if self.fixation_enabled && self.fixation_ms == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "study_config.fixation_ms",
                reason: "must be > 0 when fixation is enabled",
            });
        }
        if self.asset_root.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "study_config.asset_root",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

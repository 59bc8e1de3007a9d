#![forbid(unsafe_code)]

pub mod asset_path;
pub mod audio_gate;
pub mod content;
pub mod identity;
pub mod modality;
pub mod response;
pub mod rng;
pub mod seed;
pub mod stimulus_index;
pub mod variant;

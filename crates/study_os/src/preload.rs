#![forbid(unsafe_code)]

use serde::Serialize;
use study_engines::asset_path::AssetResolver;
use study_kernel_contracts::stimulus::{Modality, ModalityAssignment};

/// Every asset the session may request, split by media type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadManifest {
    pub images: Vec<String>,
    pub audio: Vec<String>,
}

impl PreloadManifest {
    pub fn for_session(resolver: &AssetResolver, modality: &ModalityAssignment) -> Self {
        let mut manifest = Self::default();
        for (scenario_id, m) in modality.iter() {
            let paths = resolver.preload_paths(scenario_id, m);
            match m {
                Modality::Image => manifest.images.extend(paths),
                Modality::Audio => manifest.audio.extend(paths),
            }
        }
        manifest
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &str) -> bool {
        self.images.iter().chain(self.audio.iter()).any(|p| p == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_engines::modality::{balance_session, ModalityStrategy};
    use study_engines::rng::session_rng;
    use study_kernel_contracts::participant::ParticipantHash;
    use study_kernel_contracts::scenario::ScenarioId;

    #[test]
    fn at_preload_01_manifest_covers_two_scenarios_per_modality() {
        let modality =
            balance_session(ModalityStrategy::HashDerived, ParticipantHash(0), &mut session_rng(Some(1))).unwrap();
        let m = PreloadManifest::for_session(&AssetResolver::default(), &modality);
        assert_eq!(m.images.len(), 18);
        assert_eq!(m.audio.len(), 18);
        // Even hash: the *_B scenarios are audio, so voices come from the second family.
        assert_eq!(modality.get(ScenarioId::CeoB), Some(Modality::Audio));
        assert!(m.contains("assets/audios/male/voice05_var2.wav"));
        assert!(!m.contains("assets/audios/male/voice01_var1.wav"));
        assert!(m.contains("assets/faces/female/face03_var3.png"));
    }
}

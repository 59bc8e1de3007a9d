#![forbid(unsafe_code)]

use study_kernel_contracts::scenario::ScenarioId;
use study_kernel_contracts::stimulus::{AssetIndex, GenderCategory, Modality, Variant};

pub const DEFAULT_ASSET_ROOT: &str = "assets";

/// Turns logical stimulus ids into resource paths. Pure; file existence is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    root: String,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT)
    }
}

impl AssetResolver {
    pub fn new(root: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn face_path(&self, gender: GenderCategory, index: AssetIndex, variant: Variant) -> String {
        format!(
            "{}/faces/{}/face{:02}_var{}.png",
            self.root,
            gender.as_str(),
            index.get(),
            variant.get()
        )
    }

    pub fn audio_path(&self, gender: GenderCategory, index: AssetIndex, variant: Variant) -> String {
        format!(
            "{}/audios/{}/voice{:02}_var{}.wav",
            self.root,
            gender.as_str(),
            index.get(),
            variant.get()
        )
    }

    pub fn resolve(
        &self,
        modality: Modality,
        gender: GenderCategory,
        index: AssetIndex,
        variant: Variant,
    ) -> String {
        match modality {
            Modality::Image => self.face_path(gender, index, variant),
            Modality::Audio => self.audio_path(gender, index, variant),
        }
    }

    /// Every asset a scenario may show in the given modality, all variants included.
    pub fn preload_paths(&self, scenario_id: ScenarioId, modality: Modality) -> Vec<String> {
        let gender = scenario_id.role_kind().gender();
        let indices: Vec<u8> = match modality {
            Modality::Image => (1..=3).collect(),
            Modality::Audio => {
                let base = scenario_id.family().audio_index_base();
                (base..base + 3).collect()
            }
        };
        let mut out = Vec::with_capacity(indices.len() * Variant::ALL.len());
        for i in indices {
            let Ok(index) = AssetIndex::new(i) else {
                continue;
            };
            for variant in Variant::ALL {
                out.push(self.resolve(modality, gender, index, variant));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_asset_01_paths_are_zero_padded() {
        let r = AssetResolver::default();
        let face = r.face_path(
            GenderCategory::Male,
            AssetIndex::new(2).unwrap(),
            Variant::new(3).unwrap(),
        );
        assert_eq!(face, "assets/faces/male/face02_var3.png");
        let voice = r.audio_path(
            GenderCategory::Female,
            AssetIndex::new(6).unwrap(),
            Variant::new(1).unwrap(),
        );
        assert_eq!(voice, "assets/audios/female/voice06_var1.wav");
    }

    #[test]
    fn at_asset_02_root_is_configurable() {
        let r = AssetResolver::new("https://cdn.example/study/");
        let p = r.resolve(
            Modality::Image,
            GenderCategory::Female,
            AssetIndex::new(1).unwrap(),
            Variant::new(1).unwrap(),
        );
        assert_eq!(p, "https://cdn.example/study/faces/female/face01_var1.png");
    }

    #[test]
    fn at_asset_03_preload_covers_indices_and_variants() {
        let r = AssetResolver::default();
        let faces = r.preload_paths(ScenarioId::EceB, Modality::Image);
        assert_eq!(faces.len(), 9);
        assert!(faces.contains(&"assets/faces/female/face03_var2.png".to_string()));

        let voices = r.preload_paths(ScenarioId::CeoB, Modality::Audio);
        assert_eq!(voices.len(), 9);
        assert_eq!(voices[0], "assets/audios/male/voice04_var1.wav");
        assert_eq!(voices[8], "assets/audios/male/voice06_var3.wav");
    }
}

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use study_kernel_contracts::participant::{ParticipantHash, ParticipantId};

/// Derives the stable per-participant number that hash-seeded assignments use.
pub trait SeedGenerator {
    fn seed_for(&self, participant_id: &str) -> u32;

    fn participant_hash(&self, participant_id: &ParticipantId) -> ParticipantHash {
        ParticipantHash(self.seed_for(participant_id.as_str()))
    }
}

/// 31-multiplier rolling hash over UTF-16 code units with 32-bit signed wrap,
/// returned as an absolute value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rolling31Hash;

impl SeedGenerator for Rolling31Hash {
    fn seed_for(&self, participant_id: &str) -> u32 {
        let mut h: i32 = 0;
        for unit in participant_id.encode_utf16() {
            h = (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit));
        }
        h.unsigned_abs()
    }
}

/// First four bytes of SHA-256 over the UTF-8 identifier, big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Seed;

impl SeedGenerator for Sha256Seed {
    fn seed_for(&self, participant_id: &str) -> u32 {
        let digest = Sha256::digest(participant_id.as_bytes());
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedAlgorithm {
    #[default]
    Rolling31,
    Sha256,
}

impl SeedAlgorithm {
    pub fn generator(self) -> Box<dyn SeedGenerator + Send + Sync> {
        match self {
            SeedAlgorithm::Rolling31 => Box::new(Rolling31Hash),
            SeedAlgorithm::Sha256 => Box::new(Sha256Seed),
        }
    }
}

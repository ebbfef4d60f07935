//! Portable session random stream.
//!
//! Each game owns one ChaCha20 stream keyed by HMAC-SHA256 over the user
//! seed. Every uniform draw consumes exactly one `next_u64`. The stream state
//! (key, stream id, word position) plus the draw counter is captured as an
//! [`RngSnapshot`], which restores the identical sequence after a restart.

use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::numbers::unit_interval_from_bits;

const SESSION_STREAM_TAG: &[u8] = b"beifa.session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngSnapshot {
    pub key: [u8; 32],
    pub stream: u64,
    #[serde(with = "u128_string")]
    pub word_pos: u128,
    pub draws: u64,
}

/// Counting ChaCha20 wrapper with exact state capture.
#[derive(Debug, Clone)]
pub struct SessionRng {
    rng: ChaCha20Rng,
    draws: u64,
}

impl SessionRng {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(derive_stream_key(seed, SESSION_STREAM_TAG)),
            draws: 0,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RngSnapshot {
        RngSnapshot {
            key: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
            draws: self.draws,
        }
    }

    #[must_use]
    pub fn restore(snapshot: &RngSnapshot) -> Self {
        let mut rng = ChaCha20Rng::from_seed(snapshot.key);
        rng.set_stream(snapshot.stream);
        rng.set_word_pos(snapshot.word_pos);
        Self {
            rng,
            draws: snapshot.draws,
        }
    }

    /// Uniform draw from `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        unit_interval_from_bits(self.next_u64())
    }

    /// Uniform draw from `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (high - low).mul_add(self.unit(), low)
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for SessionRng {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl Serialize for SessionRng {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SessionRng {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RngSnapshot::deserialize(deserializer).map(|snapshot| Self::restore(&snapshot))
    }
}

fn derive_stream_key(user_seed: u64, domain_tag: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut key = [0_u8; 32];
    key.copy_from_slice(&digest);
    key
}

mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

//! Seeded RNG for the **acceptance draw only** (no OS entropy).
//!
//! Integer-only: unbiased ranges via rejection sampling, explicit u64 seeding,
//! and a consumed-word counter so runs can account for every draw.
//! Cross-platform determinism comes from the explicit ChaCha20 seed mapping
//! and pinned crate versions.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::entities::AcceptBps;

/// Deterministic RNG for simulated candidate accept/decline decisions.
///
/// A single `AcceptRng` is threaded through an entire run; the stream position
/// therefore encodes the full offer history, and identical inputs + seed
/// replay identical decisions.
#[derive(Debug, Clone)]
pub struct AcceptRng {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl AcceptRng {
    /// Construct from a 64-bit seed. The mapping into the ChaCha20 32-byte
    /// seed is explicit: `seed.to_le_bytes()` into the first 8 bytes, the
    /// remaining 24 bytes zero, avoiding endianness ambiguity across
    /// platforms.
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Total number of 64-bit words consumed so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    /// Draw the next u64 from the stream and increment the word counter.
    /// This is the only place where the counter is advanced.
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }

    /// Unbiased integer in [0, n) using rejection sampling. Returns `None`
    /// if `n == 0`.
    ///
    /// Let `threshold = 2^64 mod n` (computed via `wrapping_neg() % n`).
    /// Accept `x` if `x >= threshold`; then `x % n` is uniform.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n; // == (2^64 % n)
        loop {
            let x = self.next_u64();
            if x >= threshold {
                return Some(x % n);
            }
        }
    }

    /// Resolve one offer: accept with probability `bps / 10_000`.
    /// Exactly one uniform draw is consumed per call, including the
    /// degenerate 0% and 100% probabilities, so stream positions stay
    /// aligned across parameter changes.
    #[inline]
    pub fn draw_accept(&mut self, bps: AcceptBps) -> bool {
        let v = self
            .gen_range(10_000)
            .expect("gen_range(10_000) is non-empty");
        v < u64::from(bps.as_u32())
    }
}

impl Default for AcceptRng {
    fn default() -> Self {
        Self::from_seed_u64(0)
    }
}

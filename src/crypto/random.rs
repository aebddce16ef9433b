//! Random hash generation.
//!
//! [`RandomHashGenerator`] owns both of its sources: the OS CSPRNG and a
//! seeded ChaCha20 generator used only when the OS source fails. The
//! fallback is a degraded mode meant for identifiers and test data, never
//! for key material. Both sources sit behind a mutex, so one generator can
//! be shared across threads.

use crate::types::hash::{HASH_SIZE, Hash};
use crate::warn;
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces random 32-byte hashes.
pub struct RandomHashGenerator<P = OsRng> {
    primary: Mutex<P>,
    fallback: Mutex<ChaCha20Rng>,
}

impl RandomHashGenerator<OsRng> {
    /// OS entropy, with a fallback seeded from the current time.
    pub fn new() -> Self {
        Self::with_sources(OsRng, time_seed())
    }
}

impl Default for RandomHashGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: RngCore> RandomHashGenerator<P> {
    /// Uses `primary` as the entropy source and a ChaCha20 generator seeded
    /// with `fallback_seed` when it fails.
    pub fn with_sources(primary: P, fallback_seed: u64) -> Self {
        Self {
            primary: Mutex::new(primary),
            fallback: Mutex::new(ChaCha20Rng::seed_from_u64(fallback_seed)),
        }
    }

    pub fn next_hash(&self) -> Hash {
        let mut bytes = [0u8; HASH_SIZE];
        if let Err(err) = lock(&self.primary).try_fill_bytes(&mut bytes) {
            warn!("entropy source failed ({}); using seeded fallback generator", err);
            lock(&self.fallback).fill_bytes(&mut bytes);
        }
        Hash(bytes)
    }
}

/// One hash from a fresh OS-backed generator.
pub fn random_hash() -> Hash {
    RandomHashGenerator::new().next_hash()
}

// A panic while holding the lock cannot leave an RNG in a state that matters
// here, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn time_seed() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() ^ u64::from(now.subsec_nanos()).rotate_left(32)
}

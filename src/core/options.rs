// Copyright @yucwang 2026

use std::sync::atomic::{AtomicU64, Ordering};

static SEED: AtomicU64 = AtomicU64::new(0);

/// Sets the process-wide seed mixed into every per-call random sequence.
/// Meant to be called once at startup, before any evaluation.
pub fn set_seed(seed: u64) {
    log::debug!("Process seed set to {}.", seed);
    SEED.store(seed, Ordering::Relaxed);
}

pub fn seed() -> u64 {
    SEED.load(Ordering::Relaxed)
}

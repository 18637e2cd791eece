// Copyright @yucwang 2026

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::math::constants::{ Float, Vector2f, Vector3f };

/// Incremental hash over the bit patterns of floats and integers.
#[derive(Default)]
pub struct BitHasher {
    inner: FxHasher,
}

impl BitHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.inner.write_u64(v);
        self
    }

    pub fn float(mut self, v: Float) -> Self {
        self.inner.write_u32(v.to_bits());
        self
    }

    pub fn vector2(self, v: &Vector2f) -> Self {
        self.float(v.x).float(v.y)
    }

    pub fn vector3(self, v: &Vector3f) -> Self {
        self.float(v.x).float(v.y).float(v.z)
    }

    pub fn finish(&self) -> u64 {
        self.inner.finish()
    }
}

pub fn hash_seeded_direction(seed: u64, w: &Vector3f) -> u64 {
    BitHasher::new().u64(seed).vector3(w).finish()
}

pub fn hash_direction(w: &Vector3f) -> u64 {
    BitHasher::new().vector3(w).finish()
}

pub fn hash_sample(uc: Float, u: &Vector2f) -> u64 {
    BitHasher::new().float(uc).vector2(u).finish()
}

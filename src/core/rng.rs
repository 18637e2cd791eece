// Copyright @yucwang 2026

use rand::RngCore;
use rand_pcg::Pcg32;

use crate::math::constants::{ Float, ONE_MINUS_EPSILON };

/// Counter-based generator built fresh for every call that needs random numbers.
pub struct SequenceRng {
    inner: Pcg32,
}

impl SequenceRng {
    /// `seq_index` picks the stream, `offset` the starting state within it.
    pub fn new(seq_index: u64, offset: u64) -> Self {
        Self { inner: Pcg32::new(offset, seq_index) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// Uniform sample in [0, 1).
    pub fn uniform(&mut self) -> Float {
        ((self.next_u32() as f64 * (1.0 / 4294967296.0)) as Float).min(ONE_MINUS_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_range() {
        let mut rng = SequenceRng::new(11, 5);
        for _ in 0..1024 {
            let u = rng.uniform();
            assert!(u >= 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_same_sequence_reproduces() {
        let mut a = SequenceRng::new(42, 17);
        let mut b = SequenceRng::new(42, 17);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_different_streams_diverge() {
        let mut a = SequenceRng::new(1, 17);
        let mut b = SequenceRng::new(2, 17);
        let same = (0..16).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 16);
    }
}

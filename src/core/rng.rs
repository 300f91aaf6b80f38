use hexf::*;
use crate::core::pbrt::Float;

pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1");
const PCG32_DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;
const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;

/// PCG32 generator: 64-bit state, selectable stream.
#[derive(Debug, Copy, Clone)]
pub struct RNG {
    state: u64,
    inc  : u64
}

impl Default for RNG {
    fn default() -> Self {
        Self { state: PCG32_DEFAULT_STATE, inc: PCG32_DEFAULT_STREAM }
    }
}

impl RNG {
    pub fn new(sequence_index: u64) -> Self {
        let mut rng = RNG::default();
        rng.set_sequence(sequence_index);

        rng
    }

    pub fn set_sequence(&mut self, sequence_index: u64) {
        self.set_sequence_with_offset(sequence_index, PCG32_DEFAULT_STATE);
    }

    /// Selects stream `sequence_index` and starts it from a state derived from `offset`.
    pub fn set_sequence_with_offset(&mut self, sequence_index: u64, offset: u64) {
        self.state = 0;
        self.inc = (sequence_index << 1) | 1;
        self.uniform_u32();
        self.state = self.state.wrapping_add(offset);
        self.uniform_u32();
    }

    pub fn uniform_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;

        xorshifted.rotate_right(rot)
    }

    /// Uniform integer in [0, bound) without modulo bias.
    pub fn uniform_u32_bounded(&mut self, bound: u32) -> u32 {
        let threshold = bound.wrapping_neg() % bound;

        loop {
            let r = self.uniform_u32();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    pub fn uniform_float(&mut self) -> Float {
        ONE_MINUS_EPSILON.min(self.uniform_u32() as Float * hexf32!("0x1.0p-32"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_stream_same_values() {
        let mut a = RNG::new(17);
        let mut b = RNG::new(17);

        for _ in 0..64 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }

    #[test]
    fn streams_differ() {
        let mut a = RNG::new(1);
        let mut b = RNG::new(2);
        let same = (0..64).filter(|_| a.uniform_u32() == b.uniform_u32()).count();

        assert!(same < 4);
    }

    #[test]
    fn floats_in_unit_interval() {
        let mut rng = RNG::new(3);

        for _ in 0..10000 {
            let u = rng.uniform_float();
            assert!((0.0..1.0).contains(&u));
        }
    }
}

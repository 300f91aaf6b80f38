use crate::core::rng::RNG;
use crate::core::geometry::point::Point2f;
use crate::core::pbrt::{Float, mix_bits};
use crate::core::sampler::{Sampler, Samplers};

/// Independent uniform samples from a PCG32 stream.
pub struct RandomSampler {
    rng : RNG,
    seed: u64
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: RNG::new(seed), seed }
    }
}

impl Sampler for RandomSampler {
    fn start_pixel(&mut self, index: u64) {
        self.rng.set_sequence_with_offset(mix_bits(index), mix_bits(self.seed));
    }

    fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }

    fn get_2d(&mut self) -> Point2f {
        let x = self.rng.uniform_float();
        let y = self.rng.uniform_float();

        Point2f::new(x, y)
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn clone_with_seed(&self, seed: u64) -> Samplers {
        RandomSampler::new(seed).into()
    }
}

use enum_dispatch::enum_dispatch;
use crate::core::geometry::point::{Point2i, Point2f};
use crate::core::pbrt::Float;
use crate::core::camera::CameraSample;
use crate::samplers::random::RandomSampler;

/// Thread-private source of sample values. A sampler is restarted for every
/// pixel (or photon) so the values it hands out depend only on its seed and
/// that index, never on which worker thread owns it.
#[enum_dispatch]
pub trait Sampler {
    /// Restarts the sample stream for the given pixel or photon index.
    fn start_pixel(&mut self, index: u64);

    fn get_1d(&mut self) -> Float;

    fn get_2d(&mut self) -> Point2f;

    fn get_camera_sample(&mut self, p_raster: &Point2i) -> CameraSample {
        let jitter = self.get_2d();
        let p_film = Point2f::new(p_raster.x as Float + jitter.x, p_raster.y as Float + jitter.y);

        CameraSample {
            p_film,
            p_lens: self.get_2d(),
            time: self.get_1d()
        }
    }

    fn seed(&self) -> u64;

    /// Returns an independent instance of the same kind seeded with `seed`.
    fn clone_with_seed(&self, seed: u64) -> Samplers;
}

#[enum_dispatch(Sampler)]
pub enum Samplers {
    RandomSampler
}

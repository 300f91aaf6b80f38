use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::{Result, anyhow};
use crate::core::geometry::bounds::Bounds3f;
use crate::core::params::RenderParams;
use crate::core::pbrt::Float;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RadiusMode {
    /// One radius for the whole image, shrunk after every iteration.
    Global,
    /// One radius per pixel, shrunk only where photons were found.
    PerPixel
}

impl FromStr for RadiusMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "global"   => Ok(RadiusMode::Global),
            "perPixel" => Ok(RadiusMode::PerPixel),
            other      => Err(anyhow!("Radius mode \"{}\" unknown for \"radiusMode\"", other))
        }
    }
}

impl Display for RadiusMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RadiusMode::Global   => write!(f, "global"),
            RadiusMode::PerPixel => write!(f, "perPixel")
        }
    }
}

#[derive(Debug)]
enum RadiusState {
    Uninitialized,
    Global(Float),
    PerPixel(Vec<Float>)
}

/// Gather radius of progressive photon mapping.
///
/// The radius only changes between iterations, through `decay`. Render
/// tasks read a `RadiusSnapshot` taken before the parallel phase starts.
#[derive(Debug)]
pub struct RadiusController {
    mode    : RadiusMode,
    alpha   : Float,
    state   : RadiusState,
    // Pixels whose density estimate found a photon this iteration
    hits    : Vec<AtomicBool>
}

impl RadiusController {
    pub fn new(mode: RadiusMode, alpha: Float) -> Self {
        debug_assert!(alpha > 0.0 && alpha < 1.0);

        Self { mode, alpha, state: RadiusState::Uninitialized, hits: Vec::new() }
    }

    /// Starting radius: `gatherRadius` when given, otherwise
    /// `globalLookupRadius` times half the diagonal of the scene bounds.
    pub fn initial_radius(params: &RenderParams, bounds: &Bounds3f) -> Float {
        match params.gather_radius {
            Some(r) => r,
            None    => params.global_lookup_radius * bounds.diagonal().length() * 0.5
        }
    }

    pub fn initialize(&mut self, r0: Float, npixels: usize) {
        self.state = match self.mode {
            RadiusMode::Global   => RadiusState::Global(r0),
            RadiusMode::PerPixel => {
                self.hits = (0..npixels).map(|_| AtomicBool::new(false)).collect();
                RadiusState::PerPixel(vec![r0; npixels])
            }
        };
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, RadiusState::Uninitialized)
    }

    pub fn mode(&self) -> RadiusMode {
        self.mode
    }

    pub fn snapshot(&self) -> RadiusSnapshot<'_> {
        RadiusSnapshot { controller: self }
    }

    /// Radius of pixel `pixel`, or the global radius.
    pub fn radius(&self, pixel: usize) -> Float {
        match self.state {
            RadiusState::Uninitialized  => 0.0,
            RadiusState::Global(r)      => r,
            RadiusState::PerPixel(ref r) => r[pixel]
        }
    }

    /// Largest radius over all pixels.
    pub fn max_radius(&self) -> Float {
        match self.state {
            RadiusState::Uninitialized  => 0.0,
            RadiusState::Global(r)      => r,
            RadiusState::PerPixel(ref r) => r.iter().cloned().fold(0.0, Float::max)
        }
    }

    /// Shrinks the radius at the end of an iteration.
    pub fn decay(&mut self) {
        let alpha = self.alpha;

        match self.state {
            RadiusState::Uninitialized => (),
            RadiusState::Global(ref mut r) => *r *= alpha,
            RadiusState::PerPixel(ref mut radii) => {
                for (r, hit) in radii.iter_mut().zip(self.hits.iter()) {
                    if hit.swap(false, Ordering::Relaxed) { *r *= alpha; }
                }
            }
        }
    }
}

/// Read-only view of the radii handed to the tasks of one iteration.
#[derive(Debug, Copy, Clone)]
pub struct RadiusSnapshot<'a> {
    controller: &'a RadiusController
}

impl<'a> RadiusSnapshot<'a> {
    pub fn radius(&self, pixel: usize) -> Float {
        self.controller.radius(pixel)
    }

    /// Records that the estimate for `pixel` gathered at least one photon.
    pub fn record_hit(&self, pixel: usize) {
        if let Some(h) = self.controller.hits.get(pixel) {
            h.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn global_radius_decays_geometrically() {
        let mut rc = RadiusController::new(RadiusMode::Global, 0.7);
        assert!(!rc.is_active());
        rc.initialize(2.0, 4);

        for k in 1..=6 {
            rc.decay();
            assert!(relative_eq!(rc.radius(3), 2.0 * (0.7 as Float).powi(k), max_relative = 1e-5));
        }
    }

    #[test]
    fn per_pixel_radius_shrinks_only_where_photons_were_found() {
        let mut rc = RadiusController::new(RadiusMode::PerPixel, 0.5);
        rc.initialize(1.0, 3);

        rc.snapshot().record_hit(1);
        rc.decay();
        assert_eq!(rc.radius(0), 1.0);
        assert_eq!(rc.radius(1), 0.5);

        // Hits are cleared by the decay
        rc.decay();
        assert_eq!(rc.radius(1), 0.5);
        assert_eq!(rc.max_radius(), 1.0);
    }

    #[test]
    fn mode_names() {
        assert_eq!("perPixel".parse::<RadiusMode>().unwrap(), RadiusMode::PerPixel);
        assert!("pixel".parse::<RadiusMode>().is_err());
    }
}

use crate::core::spectrum::Spectrum;
use crate::core::material::{Material, TransportMode};
use crate::core::interaction::SurfaceInteraction;
use crate::core::reflection::{BSDF, LambertianReflection};
use crate::core::pbrt::INFINITY;

/// Ideal diffuse surface.
#[derive(Debug, Clone)]
pub struct MatteMaterial {
    kd: Spectrum
}

impl MatteMaterial {
    pub fn new(kd: Spectrum) -> Self {
        Self { kd }
    }
}

impl Material for MatteMaterial {
    fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, _mode: TransportMode) {
        let mut bsdf = BSDF::new(si, 1.0);
        let r = self.kd.clamp(0.0, INFINITY);

        if !r.is_black() {
            bsdf.add(LambertianReflection::new(r).into());
        }

        si.bsdf = Some(bsdf);
    }
}

use crate::core::spectrum::Spectrum;
use crate::core::material::{Material, TransportMode};
use crate::core::interaction::SurfaceInteraction;
use crate::core::reflection::{BSDF, FresnelSpecular};
use crate::core::pbrt::{Float, INFINITY};

/// Smooth dielectric interface.
#[derive(Debug, Clone)]
pub struct GlassMaterial {
    kr  : Spectrum,
    kt  : Spectrum,
    eta : Float
}

impl GlassMaterial {
    pub fn new(kr: Spectrum, kt: Spectrum, eta: Float) -> Self {
        Self { kr, kt, eta }
    }
}

impl Material for GlassMaterial {
    fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, mode: TransportMode) {
        let mut bsdf = BSDF::new(si, self.eta);
        let r = self.kr.clamp(0.0, INFINITY);
        let t = self.kt.clamp(0.0, INFINITY);

        if !r.is_black() || !t.is_black() {
            bsdf.add(FresnelSpecular::new(r, t, 1.0, self.eta, mode).into());
        }

        si.bsdf = Some(bsdf);
    }
}

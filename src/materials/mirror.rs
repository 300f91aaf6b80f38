use crate::core::spectrum::Spectrum;
use crate::core::material::{Material, TransportMode};
use crate::core::interaction::SurfaceInteraction;
use crate::core::reflection::{BSDF, SpecularReflection, FresnelNoOp};
use crate::core::pbrt::INFINITY;

#[derive(Debug, Clone)]
pub struct MirrorMaterial {
    kr: Spectrum
}

impl MirrorMaterial {
    pub fn new(kr: Spectrum) -> Self {
        Self { kr }
    }
}

impl Material for MirrorMaterial {
    fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, _mode: TransportMode) {
        let mut bsdf = BSDF::new(si, 1.0);
        let r = self.kr.clamp(0.0, INFINITY);

        if !r.is_black() {
            bsdf.add(SpecularReflection::new(r, FresnelNoOp.into()).into());
        }

        si.bsdf = Some(bsdf);
    }
}

use crate::core::spectrum::Spectrum;
use crate::core::material::{Material, TransportMode};
use crate::core::interaction::SurfaceInteraction;
use crate::core::reflection::{BSDF, LambertianReflection, MicrofacetReflection, FresnelDielectric};
use crate::core::microfacet::TrowbridgeReitzDistribution;
use crate::core::pbrt::{Float, INFINITY};

/// Diffuse base under a glossy dielectric coat.
#[derive(Debug, Clone)]
pub struct PlasticMaterial {
    kd              : Spectrum,
    ks              : Spectrum,
    roughness       : Float,
    remap_roughness : bool
}

impl PlasticMaterial {
    pub fn new(kd: Spectrum, ks: Spectrum, roughness: Float, remap_roughness: bool) -> Self {
        Self { kd, ks, roughness, remap_roughness }
    }
}

impl Material for PlasticMaterial {
    fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, _mode: TransportMode) {
        let mut bsdf = BSDF::new(si, 1.0);

        let kd = self.kd.clamp(0.0, INFINITY);
        if !kd.is_black() {
            bsdf.add(LambertianReflection::new(kd).into());
        }

        let ks = self.ks.clamp(0.0, INFINITY);
        if !ks.is_black() {
            let alpha = if self.remap_roughness {
                TrowbridgeReitzDistribution::roughness_to_alpha(self.roughness)
            } else {
                self.roughness
            };
            let distrib = TrowbridgeReitzDistribution::new(alpha);
            let fresnel = FresnelDielectric::new(1.5, 1.0);

            bsdf.add(MicrofacetReflection::new(ks, distrib.into(), fresnel.into()).into());
        }

        si.bsdf = Some(bsdf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::point::{Point2f, Point3f};
    use crate::core::geometry::vector::Vector3f;
    use crate::core::geometry::normal::Normal3f;
    use crate::core::reflection::BxDFType;

    #[test]
    fn has_diffuse_and_glossy_lobes() {
        let mut si = SurfaceInteraction::new(
            Point3f::default(), Vector3f::default(), Point2f::default(),
            Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(1.0, 0.0, 0.0),
            Normal3f::new(0.0, 0.0, 1.0), 0.0);
        let m = PlasticMaterial::new(Spectrum::new(0.25), Spectrum::new(0.25), 0.1, true);
        m.compute_scattering_functions(&mut si, TransportMode::Radiance);

        let bsdf = si.bsdf.as_ref().unwrap();
        assert_eq!(bsdf.num_components(BxDFType::All as u8), 2);
        assert_eq!(bsdf.num_components(BxDFType::Reflection as u8 | BxDFType::Glossy as u8), 1);
    }
}

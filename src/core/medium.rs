use std::fmt::{Display, Result, Formatter};
use enum_dispatch::enum_dispatch;
use crate::core::geometry::vector::{Vector3f, vec3_coordinate_system};
use crate::core::geometry::geometry::spherical_direction_frame;
use crate::core::geometry::point::Point2f;
use crate::core::geometry::ray::Ray;
use crate::core::pbrt::{Float, INV4_PI, PI};
use crate::core::spectrum::Spectrum;
use crate::core::sampler::Samplers;
use crate::core::interaction::MediumInteraction;
use crate::media::homogeneous::HomogeneousMedium;

/// Index of a medium in the scene's medium table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MediumId(pub usize);

#[enum_dispatch(Mediums)]
pub trait Medium {
    /// Beam transmittance along the ray up to `t_max`.
    fn tr(&self, ray: &Ray, sampler: &mut Samplers) -> Spectrum;

    /// Samples a scattering event along the ray. Returns the throughput
    /// factor and, if the sampled distance falls before `t_max`, the
    /// interaction in the medium.
    fn sample(&self, ray: &Ray, sampler: &mut Samplers) -> (Spectrum, Option<MediumInteraction>);
}

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Mediums {
    HomogeneousMedium
}

/// Media on either side of a surface. `None` means vacuum.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct MediumInterface {
    pub inside  : Option<MediumId>,
    pub outside : Option<MediumId>
}

impl MediumInterface {
    pub fn new(medium: Option<MediumId>) -> Self {
        Self { inside: medium, outside: medium }
    }

    pub fn from_mediums(inside: Option<MediumId>, outside: Option<MediumId>) -> Self {
        Self { inside, outside }
    }

    pub fn is_medium_transition(&self) -> bool {
        self.inside != self.outside
    }
}

#[enum_dispatch]
pub trait PhaseFunction {
    fn p(&self, wo: &Vector3f, wi: &Vector3f) -> Float;

    /// Returns (p(wo, wi), wi).
    fn sample_p(&self, wo: &Vector3f, u: &Point2f) -> (Float, Vector3f);
}

#[enum_dispatch(PhaseFunction)]
#[derive(Debug, Copy, Clone)]
pub enum PhaseFunctions {
    HenyeyGreenstein
}

#[inline(always)]
pub fn phase_hg(cos_theta: Float, g: Float) -> Float {
    let denom = 1.0 + g * g + 2.0 * g * cos_theta;

    INV4_PI * (1.0 - g * g) / (denom * denom.sqrt())
}

#[derive(Debug, Copy, Clone)]
pub struct HenyeyGreenstein {
    g: Float
}

impl HenyeyGreenstein {
    pub fn new(g: Float) -> Self {
        Self { g }
    }
}

impl PhaseFunction for HenyeyGreenstein {
    fn p(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        phase_hg(wo.dot(wi), self.g)
    }

    fn sample_p(&self, wo: &Vector3f, u: &Point2f) -> (Float, Vector3f) {
        let g = self.g;
        let cos_theta = if g.abs() < 1.0e-3 {
            1.0 - 2.0 * u.x
        } else {
            let sqr_term = (1.0 - g * g) / (1.0 + g - 2.0 * g * u.x);

            (1.0 + g * g - sqr_term * sqr_term) / (2.0 * g)
        };

        // wi is expressed around -wo
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * u.y;
        let (v1, v2) = vec3_coordinate_system(wo);
        let wi = spherical_direction_frame(sin_theta, cos_theta, phi, &v1, &v2, &-*wo);

        (phase_hg(-cos_theta, g), wi)
    }
}

impl Display for HenyeyGreenstein {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ HenyeyGreenstein g: {} ]", self.g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn sampled_value_matches_evaluation() {
        let hg = HenyeyGreenstein::new(0.4);
        let wo = Vector3f::new(0.0, 0.6, 0.8);

        for i in 0..8 {
            let u = Point2f::new((i as Float + 0.5) / 8.0, 0.3);
            let (p, wi) = hg.sample_p(&wo, &u);
            assert!(relative_eq!(p, hg.p(&wo, &wi), max_relative = 1e-3));
        }
    }

    #[test]
    fn isotropic_is_uniform() {
        let hg = HenyeyGreenstein::new(0.0);
        let wo = Vector3f::new(1.0, 0.0, 0.0);

        assert!(relative_eq!(hg.p(&wo, &wo), INV4_PI));
        assert!(relative_eq!(hg.p(&wo, &-wo), INV4_PI));
    }
}

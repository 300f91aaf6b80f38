use std::fmt::{Display, Result, Formatter};
use enum_dispatch::enum_dispatch;
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::point::Point2f;
use crate::core::geometry::geometry::spherical_direction;
use crate::core::pbrt::{Float, PI};
use crate::core::reflection::{abs_cos_theta, cos2_theta, tan2_theta, same_hemisphere};

#[enum_dispatch]
pub trait MicrofacetDistribution {
    fn d(&self, wh: &Vector3f) -> Float;

    fn lambda(&self, w: &Vector3f) -> Float;

    fn g1(&self, w: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Samples a microfacet normal in the hemisphere of `wo` proportional to D(wh)|cos(wh)|.
    fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f;

    fn pdf(&self, _wo: &Vector3f, wh: &Vector3f) -> Float {
        self.d(wh) * abs_cos_theta(wh)
    }
}

#[enum_dispatch(MicrofacetDistribution)]
#[derive(Debug, Copy, Clone)]
pub enum MicrofacetDistributions {
    TrowbridgeReitzDistribution
}

/// Isotropic GGX distribution.
#[derive(Debug, Copy, Clone)]
pub struct TrowbridgeReitzDistribution {
    alpha: Float
}

impl TrowbridgeReitzDistribution {
    pub fn new(alpha: Float) -> Self {
        Self { alpha: alpha.max(0.001) }
    }

    /// Maps a perceptual roughness in [0, 1] to the distribution's alpha.
    pub fn roughness_to_alpha(roughness: Float) -> Float {
        let x = roughness.max(1.0e-3).ln();

        1.62142 + 0.819955 * x + 0.1734 * x * x +
        0.0171201 * x * x * x + 0.000640711 * x * x * x * x
    }
}

impl MicrofacetDistribution for TrowbridgeReitzDistribution {
    fn d(&self, wh: &Vector3f) -> Float {
        let tan2 = tan2_theta(wh);
        if tan2.is_infinite() || tan2.is_nan() { return 0.0; }

        let a2 = self.alpha * self.alpha;
        let cos4 = cos2_theta(wh) * cos2_theta(wh);
        let e = 1.0 + tan2 / a2;

        1.0 / (PI * a2 * cos4 * e * e)
    }

    fn lambda(&self, w: &Vector3f) -> Float {
        let tan2 = tan2_theta(w);
        if tan2.is_infinite() || tan2.is_nan() { return 0.0; }

        ((1.0 + self.alpha * self.alpha * tan2).sqrt() - 1.0) / 2.0
    }

    fn sample_wh(&self, wo: &Vector3f, u: &Point2f) -> Vector3f {
        let phi = 2.0 * PI * u.y;
        let tan2 = self.alpha * self.alpha * u.x / (1.0 - u.x);
        let cos_theta = 1.0 / (1.0 + tan2).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let wh = spherical_direction(sin_theta, cos_theta, phi);

        if same_hemisphere(wo, &wh) { wh } else { -wh }
    }
}

impl Display for TrowbridgeReitzDistribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ TrowbridgeReitzDistribution alpha: {} ]", self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projected_normals_cover_unit_area() {
        let d = TrowbridgeReitzDistribution::new(0.5);
        let n = 20000;
        let dtheta = 0.5 * PI / n as Float;
        let mut sum = 0.0;

        for i in 0..n {
            let theta = (i as Float + 0.5) * dtheta;
            let wh = spherical_direction(theta.sin(), theta.cos(), 0.0);
            sum += d.d(&wh) * theta.cos() * theta.sin() * dtheta;
        }

        assert!((2.0 * PI * sum - 1.0).abs() < 1e-2);
    }

    #[test]
    fn sampled_normals_share_hemisphere() {
        let d = TrowbridgeReitzDistribution::new(0.3);
        let wo = Vector3f::new(0.2, 0.1, -0.9).normalize();

        for i in 0..32 {
            let u = Point2f::new((i as Float + 0.5) / 32.0, 0.7);
            assert!(same_hemisphere(&wo, &d.sample_wh(&wo, &u)));
        }
    }
}

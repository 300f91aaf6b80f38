use crate::core::spectrum::Spectrum;
use crate::core::pbrt::Float;
use crate::core::medium::{Medium, HenyeyGreenstein};
use crate::core::sampler::{Samplers, Sampler};
use crate::core::interaction::MediumInteraction;
use crate::core::geometry::ray::Ray;

/// Medium with constant absorption and scattering coefficients.
#[derive(Debug, Clone)]
pub struct HomogeneousMedium {
    g       : Float,
    sigma_t : Spectrum,
    sigma_s : Spectrum
}

impl HomogeneousMedium {
    pub fn new(sigma_a: &Spectrum, sigma_s: &Spectrum, g: Float) -> Self {
        Self {
            g,
            sigma_s: *sigma_s,
            sigma_t: *sigma_a + *sigma_s
        }
    }

    fn transmittance(&self, dist: Float) -> Spectrum {
        (-self.sigma_t * dist.min(Float::MAX)).exp()
    }
}

impl Medium for HomogeneousMedium {
    fn tr(&self, ray: &Ray, _sampler: &mut Samplers) -> Spectrum {
        self.transmittance(ray.t_max * ray.d.length())
    }

    fn sample(&self, ray: &Ray, sampler: &mut Samplers) -> (Spectrum, Option<MediumInteraction>) {
        // Pick a color channel, then a distance from its exponential falloff
        let channel = ((sampler.get_1d() * 3.0) as usize).min(2);
        let sigma = self.sigma_t[channel];
        let len = ray.d.length();
        let dist = if sigma > 0.0 { -(1.0 - sampler.get_1d()).ln() / sigma } else { Float::INFINITY };
        let t = (dist / len).min(ray.t_max);
        let sampled_medium = t < ray.t_max;

        let tr = self.transmittance(t * len);
        let density = if sampled_medium { self.sigma_t * tr } else { tr };
        let mut pdf = (density[0] + density[1] + density[2]) / 3.0;
        if pdf == 0.0 { pdf = 1.0; }

        if sampled_medium {
            stats::medium_scatter::inc();
            let mi = MediumInteraction::new(
                ray.find_point(t), -ray.d, ray.time, ray.medium, HenyeyGreenstein::new(self.g).into());

            (tr * self.sigma_s / pdf, Some(mi))
        } else {
            (tr / pdf, None)
        }
    }
}

mod stats {
    use crate::stat_counter;

    stat_counter!("Media/Medium scattering events", medium_scatter);
}

pub fn init_stats() {
    stats::medium_scatter::init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use crate::core::geometry::point::Point3f;
    use crate::core::geometry::vector::Vector3f;
    use crate::core::medium::MediumId;
    use crate::samplers::random::RandomSampler;

    #[test]
    fn transmittance_follows_beer_lambert() {
        let m = HomogeneousMedium::new(&Spectrum::new(0.5), &Spectrum::new(0.5), 0.0);
        let mut sampler: Samplers = RandomSampler::new(0).into();
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 2.0), 1.0, 0.0, Some(MediumId(0)));
        let tr = m.tr(&ray, &mut sampler);

        assert!(relative_eq!(tr[0], (-2.0 as Float).exp()));
    }

    #[test]
    fn vacuum_like_medium_never_scatters() {
        let m = HomogeneousMedium::new(&Spectrum::new(0.0), &Spectrum::new(0.0), 0.0);
        let mut sampler: Samplers = RandomSampler::new(1).into();
        let ray = Ray::new(Point3f::default(), Vector3f::new(1.0, 0.0, 0.0), 10.0, 0.0, Some(MediumId(0)));

        for _ in 0..16 {
            let (beta, mi) = m.sample(&ray, &mut sampler);
            assert!(mi.is_none());
            assert!(relative_eq!(beta[1], 1.0));
        }
    }
}

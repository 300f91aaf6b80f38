use crate::core::spectrum::Spectrum;
use crate::core::geometry::point::{Point3f, Point2f};
use crate::core::geometry::vector::{Vector3f, vec3_coordinate_system};
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::normal::Normal3f;
use crate::core::pbrt::{Float, PI, INFINITY};
use crate::core::sampling::{concentric_sample_disk, uniform_sample_sphere, uniform_sphere_pdf};
use crate::core::light::{Light, LightFlags, LightLiSample, LightLeSample, VisibilityTester};
use crate::core::interaction::InteractionData;

/// Constant radiance arriving from every direction at infinity.
#[derive(Debug, Clone)]
pub struct UniformInfiniteLight {
    lemit        : Spectrum,
    world_center : Point3f,
    world_radius : Float
}

impl UniformInfiniteLight {
    pub fn new(lemit: Spectrum) -> Self {
        Self { lemit, world_center: Point3f::default(), world_radius: 0.0 }
    }

    pub fn world_radius(&self) -> Float {
        self.world_radius
    }
}

impl Light for UniformInfiniteLight {
    fn flags(&self) -> u8 {
        LightFlags::Infinite as u8
    }

    fn power(&self) -> Spectrum {
        self.lemit * 4.0 * PI * PI * self.world_radius * self.world_radius
    }

    fn preprocess(&mut self, world_bound: &Bounds3f) {
        let (c, r) = world_bound.bounding_sphere();
        self.world_center = c;
        self.world_radius = r;
    }

    fn le(&self, _r: &Ray) -> Spectrum {
        self.lemit
    }

    fn sample_li(&self, re: &InteractionData, u: &Point2f) -> LightLiSample {
        let wi = uniform_sample_sphere(u);
        let p1 = InteractionData {
            p   : re.p + wi * (2.0 * self.world_radius),
            time: re.time,
            ..Default::default()
        };

        LightLiSample {
            li : self.lemit,
            wi,
            pdf: uniform_sphere_pdf(),
            vis: VisibilityTester::new(*re, p1)
        }
    }

    fn pdf_li(&self, _re: &InteractionData, _wi: &Vector3f) -> Float {
        uniform_sphere_pdf()
    }

    fn sample_le(&self, u1: &Point2f, u2: &Point2f, time: Float) -> LightLeSample {
        // Direction first, then a point on the disc facing it that covers the scene
        let d = -uniform_sample_sphere(u1);
        let (v1, v2) = vec3_coordinate_system(&-d);
        let cd = concentric_sample_disk(u2);
        let pdisk = self.world_center + (v1 * cd.x + v2 * cd.y) * self.world_radius;
        let ray = Ray::new(pdisk + -d * self.world_radius, d, INFINITY, time, None);

        LightLeSample {
            le     : self.lemit,
            ray,
            n_light: Normal3f::from(d),
            pdf_pos: 1.0 / (PI * self.world_radius * self.world_radius),
            pdf_dir: uniform_sphere_pdf()
        }
    }

    fn pdf_le(&self, _ray: &Ray, _n_light: &Normal3f) -> (Float, Float) {
        (1.0 / (PI * self.world_radius * self.world_radius), uniform_sphere_pdf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn emitted_rays_start_outside_the_scene() {
        let mut light = UniformInfiniteLight::new(Spectrum::new(1.0));
        light.preprocess(&Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0)));
        let r = 3.0_f32.sqrt();
        assert!(relative_eq!(light.world_radius(), r, max_relative = 1e-5));

        let s = light.sample_le(&Point2f::new(0.3, 0.8), &Point2f::new(0.6, 0.1), 0.0);
        assert!(s.ray.o.distance(&Point3f::default()) >= r - 1e-4);
        // The ray heads back toward the scene
        assert!(Vector3f::from(s.ray.o).dot(&s.ray.d) < 0.0);
    }
}

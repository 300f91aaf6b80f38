use crate::core::geometry::point::{Point3f, Point2f};
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::normal::Normal3f;
use crate::core::spectrum::Spectrum;
use crate::core::medium::MediumInterface;
use crate::core::light::{Light, LightFlags, LightLiSample, LightLeSample, VisibilityTester};
use crate::core::interaction::InteractionData;
use crate::core::pbrt::{PI, Float, INFINITY};
use crate::core::sampling::{uniform_sample_sphere, uniform_sphere_pdf};

/// Isotropic point emitter of radiant intensity `I`.
#[derive(Debug, Clone)]
pub struct PointLight {
    plight          : Point3f,
    I               : Spectrum,
    medium_interface: MediumInterface
}

impl PointLight {
    pub fn new(plight: Point3f, I: Spectrum, medium_interface: MediumInterface) -> Self {
        Self { plight, I, medium_interface }
    }
}

impl Light for PointLight {
    fn flags(&self) -> u8 {
        LightFlags::DeltaPosition as u8
    }

    fn power(&self) -> Spectrum {
        self.I * 4.0 * PI
    }

    fn sample_li(&self, re: &InteractionData, _u: &Point2f) -> LightLiSample {
        let d2 = self.plight.distance_squared(&re.p);
        if d2 == 0.0 { return LightLiSample::default(); }

        let p1 = InteractionData {
            p               : self.plight,
            time            : re.time,
            medium_interface: self.medium_interface,
            ..Default::default()
        };

        LightLiSample {
            li : self.I / d2,
            wi : (self.plight - re.p).normalize(),
            pdf: 1.0,
            vis: VisibilityTester::new(*re, p1)
        }
    }

    fn pdf_li(&self, _re: &InteractionData, _wi: &Vector3f) -> Float {
        0.0
    }

    fn sample_le(&self, u1: &Point2f, _u2: &Point2f, time: Float) -> LightLeSample {
        let ray = Ray::new(
            self.plight, uniform_sample_sphere(u1), INFINITY, time, self.medium_interface.inside);

        LightLeSample {
            le     : self.I,
            ray,
            n_light: Normal3f::from(ray.d),
            pdf_pos: 1.0,
            pdf_dir: uniform_sphere_pdf()
        }
    }

    fn pdf_le(&self, _ray: &Ray, _n_light: &Normal3f) -> (Float, Float) {
        (0.0, uniform_sphere_pdf())
    }
}

use std::sync::Arc;
use crate::core::spectrum::Spectrum;
use crate::core::shape::{Shape, Shapes};
use crate::core::pbrt::{Float, PI};
use crate::core::medium::MediumInterface;
use crate::core::light::{Light, LightFlags, LightLiSample, LightLeSample, VisibilityTester};
use crate::core::geometry::vector::{Vector3f, vec3_coordinate_system};
use crate::core::geometry::point::Point2f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::normal::Normal3f;
use crate::core::interaction::{Interaction, InteractionData};
use crate::core::rng::ONE_MINUS_EPSILON;
use crate::core::sampling::{cosine_sample_hemisphere, cosine_hemisphere_pdf};

/// Shape emitting constant radiance from its front face, or from both faces
/// when two-sided.
#[derive(Debug, Clone)]
pub struct DiffuseAreaLight {
    lemit            : Spectrum,
    shape            : Arc<Shapes>,
    two_sided        : bool,
    area             : Float,
    medium_interface : MediumInterface
}

impl DiffuseAreaLight {
    pub fn new(lemit: Spectrum, shape: Arc<Shapes>, two_sided: bool, mi: MediumInterface) -> Self {
        let area = shape.area();

        Self { lemit, shape, two_sided, area, medium_interface: mi }
    }
}

impl Light for DiffuseAreaLight {
    fn flags(&self) -> u8 {
        LightFlags::Area as u8
    }

    fn power(&self) -> Spectrum {
        let sides = if self.two_sided { 2.0 } else { 1.0 };

        self.lemit * sides * self.area * PI
    }

    fn l(&self, it: &InteractionData, w: &Vector3f) -> Spectrum {
        if self.two_sided || it.n.dot_vec(w) > 0.0 {
            self.lemit
        } else {
            Spectrum::new(0.0)
        }
    }

    fn sample_li(&self, re: &InteractionData, u: &Point2f) -> LightLiSample {
        let (mut pshape, pdf) = self.shape.sample_ref(re, u);
        pshape.medium_interface = self.medium_interface;
        pshape.time = re.time;

        if pdf == 0.0 || (pshape.p - re.p).length_squared() == 0.0 {
            return LightLiSample::default();
        }

        let wi = (pshape.p - re.p).normalize();

        LightLiSample {
            li: self.l(&pshape, &-wi),
            wi,
            pdf,
            vis: VisibilityTester::new(*re, pshape)
        }
    }

    fn pdf_li(&self, re: &InteractionData, wi: &Vector3f) -> Float {
        self.shape.pdf_ref(re, wi)
    }

    fn sample_le(&self, u1: &Point2f, u2: &Point2f, time: Float) -> LightLeSample {
        let (mut pshape, pdf_pos) = self.shape.sample(u1);
        pshape.medium_interface = self.medium_interface;
        pshape.time = time;

        // Cosine-weighted direction around the normal, on a randomly chosen
        // side for two-sided emitters
        let (w, pdf_dir) = if self.two_sided {
            let mut u = *u2;
            let front = u.x < 0.5;
            u.x = if front { u.x * 2.0 } else { (u.x - 0.5) * 2.0 }.min(ONE_MINUS_EPSILON);

            let mut w = cosine_sample_hemisphere(&u);
            if !front { w.z = -w.z; }

            (w, 0.5 * cosine_hemisphere_pdf(w.z.abs()))
        } else {
            let w = cosine_sample_hemisphere(u2);

            (w, cosine_hemisphere_pdf(w.z))
        };

        let n = Vector3f::from(pshape.n);
        let (v1, v2) = vec3_coordinate_system(&n);
        let w = v1 * w.x + v2 * w.y + n * w.z;

        LightLeSample {
            le: self.l(&pshape, &w),
            ray: pshape.spawn_ray(&w),
            n_light: pshape.n,
            pdf_pos,
            pdf_dir
        }
    }

    fn pdf_le(&self, ray: &Ray, n_light: &Normal3f) -> (Float, Float) {
        let pdf_dir = if self.two_sided {
            0.5 * cosine_hemisphere_pdf(n_light.abs_dot_vec(&ray.d))
        } else {
            cosine_hemisphere_pdf(n_light.dot_vec(&ray.d)).max(0.0)
        };

        (1.0 / self.area, pdf_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use crate::core::geometry::point::Point3f;
    use crate::shapes::triangle::create_quad;

    fn ceiling_light() -> DiffuseAreaLight {
        // Unit square at y = 1 facing down
        let quad = create_quad(
            Point3f::new(-0.5, 1.0, -0.5), Point3f::new(0.5, 1.0, -0.5),
            Point3f::new(0.5, 1.0, 0.5), Point3f::new(-0.5, 1.0, 0.5), false);
        let shape = quad[0].clone();

        DiffuseAreaLight::new(Spectrum::new(2.0), shape, false, MediumInterface::default())
    }

    #[test]
    fn emits_from_front_face_only() {
        let light = ceiling_light();
        let (p, _) = light.shape.sample(&Point2f::new(0.3, 0.3));
        let down = Vector3f::new(0.0, -1.0, 0.0);

        assert!(p.n.dot_vec(&down) > 0.0);
        assert_eq!(light.l(&p, &down), Spectrum::new(2.0));
        assert!(light.l(&p, &-down).is_black());
    }

    #[test]
    fn emitted_rays_leave_the_front_face() {
        let light = ceiling_light();

        for i in 0..8 {
            let u = Point2f::new((i as Float + 0.5) / 8.0, 0.25);
            let s = light.sample_le(&Point2f::new(0.4, 0.2), &u, 0.0);
            let (pdf_pos, pdf_dir) = light.pdf_le(&s.ray, &s.n_light);

            assert!(s.ray.d.y < 0.0);
            assert!(relative_eq!(pdf_pos, s.pdf_pos, max_relative = 1e-4));
            assert!(relative_eq!(pdf_dir, s.pdf_dir, max_relative = 1e-3));
        }
    }
}

use crate::core::pbrt::{Float, PI, gamma, quadratic};
use crate::core::shape::{Shape, shape_pdf_by_area, shape_sample_by_area};
use crate::core::geometry::point::{Point2f, Point3f};
use crate::core::geometry::vector::{Vector3f, vec3_coordinate_system};
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::geometry::{offset_ray_origin, spherical_direction_frame};
use crate::core::interaction::{SurfaceInteraction, InteractionData};
use crate::core::sampling::{uniform_sample_sphere, uniform_cone_pdf};

/// Full sphere given by its world-space center and radius.
#[derive(Debug, Clone)]
pub struct Sphere {
    pub center              : Point3f,
    pub radius              : Float,
    pub reverse_orientation : bool
}

impl Sphere {
    pub fn new(center: Point3f, radius: Float, reverse_orientation: bool) -> Self {
        Self { center, radius, reverse_orientation }
    }

    fn oriented(&self, n: Normal3f) -> Normal3f {
        if self.reverse_orientation { -n } else { n }
    }

    fn p_error(&self, pobj: &Vector3f) -> Vector3f {
        (pobj.abs() + Vector3f::from(self.center).abs()) * gamma(6)
    }
}

impl Shape for Sphere {
    fn world_bound(&self) -> Bounds3f {
        let r = Vector3f::new(self.radius, self.radius, self.radius);

        Bounds3f::new(self.center - r, self.center + r)
    }

    fn intersect(&self, r: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let o = r.o - self.center;
        let a = r.d.length_squared();
        let b = 2.0 * r.d.dot(&o);
        let c = o.length_squared() - self.radius * self.radius;

        let (t0, t1) = quadratic(a, b, c)?;
        if t0 >= r.t_max || t1 <= 0.0 { return None; }

        let t = if t0 > 0.0 {
            t0
        } else if t1 < r.t_max {
            t1
        } else {
            return None;
        };

        // Reproject onto the surface to tighten the error bound
        let mut pobj = r.find_point(t) - self.center;
        pobj *= self.radius / pobj.length();
        if pobj.x == 0.0 && pobj.y == 0.0 {
            pobj.x = 1.0e-5 * self.radius;
        }

        let mut phi = pobj.y.atan2(pobj.x);
        if phi < 0.0 { phi += 2.0 * PI; }
        let theta = (pobj.z / self.radius).max(-1.0).min(1.0).acos();
        let uv = Point2f::new(phi / (2.0 * PI), (PI - theta) / PI);
        let dpdu = Vector3f::new(-2.0 * PI * pobj.y, 2.0 * PI * pobj.x, 0.0);
        let n = self.oriented(Normal3f::from(pobj / self.radius));

        let si = SurfaceInteraction::new(
            self.center + pobj, self.p_error(&pobj), uv, -r.d, dpdu, n, r.time);

        Some((t, si))
    }

    fn area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }

    fn sample(&self, u: &Point2f) -> (InteractionData, Float) {
        let pobj = uniform_sample_sphere(u) * self.radius;
        let mut it = InteractionData::default();
        it.n = self.oriented(Normal3f::from(pobj / self.radius));
        it.p = self.center + pobj;
        it.p_error = self.p_error(&pobj);

        (it, 1.0 / self.area())
    }

    fn sample_ref(&self, refp: &InteractionData, u: &Point2f) -> (InteractionData, Float) {
        // Points inside see the whole sphere
        let porigin = offset_ray_origin(&refp.p, &refp.p_error, &refp.n, &(self.center - refp.p));
        if porigin.distance_squared(&self.center) <= self.radius * self.radius {
            return shape_sample_by_area(self, refp, u);
        }

        // Sample the cone subtended by the sphere
        let dc = refp.p.distance(&self.center);
        let wc = (self.center - refp.p) / dc;
        let (wcx, wcy) = vec3_coordinate_system(&wc);

        let sin_theta_max = self.radius / dc;
        let sin2_theta_max = sin_theta_max * sin_theta_max;
        let cos_theta_max = (1.0 - sin2_theta_max).max(0.0).sqrt();

        let (sin2_theta, cos_theta) = if sin2_theta_max < 0.00068523 {
            // Small angles lose too much precision with the direct form
            let s2 = sin2_theta_max * u.x;
            (s2, (1.0 - s2).sqrt())
        } else {
            let c = (cos_theta_max - 1.0) * u.x + 1.0;
            (1.0 - c * c, c)
        };

        let inv_sin_theta_max = 1.0 / sin_theta_max;
        let cos_alpha = sin2_theta * inv_sin_theta_max +
            cos_theta * (1.0 - sin2_theta * inv_sin_theta_max * inv_sin_theta_max).max(0.0).sqrt();
        let sin_alpha = (1.0 - cos_alpha * cos_alpha).max(0.0).sqrt();
        let phi = u.y * 2.0 * PI;

        let nworld = spherical_direction_frame(sin_alpha, cos_alpha, phi, &-wcx, &-wcy, &-wc);
        let pobj = nworld * self.radius;
        let mut it = InteractionData::default();
        it.p = self.center + pobj;
        it.p_error = self.p_error(&pobj);
        it.n = self.oriented(Normal3f::from(nworld));

        (it, uniform_cone_pdf(cos_theta_max))
    }

    fn pdf_ref(&self, refp: &InteractionData, wi: &Vector3f) -> Float {
        let porigin = offset_ray_origin(&refp.p, &refp.p_error, &refp.n, &(self.center - refp.p));
        if porigin.distance_squared(&self.center) <= self.radius * self.radius {
            return shape_pdf_by_area(self, refp, wi);
        }

        let sin2_theta_max = self.radius * self.radius / refp.p.distance_squared(&self.center);
        let cos_theta_max = (1.0 - sin2_theta_max).max(0.0).sqrt();

        uniform_cone_pdf(cos_theta_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn hits_near_side_from_outside() {
        let s = Sphere::new(Point3f::new(0.0, 0.0, 5.0), 1.0, false);
        let r = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY, 0.0, None);
        let (t, si) = s.intersect(&r).unwrap();

        assert!(relative_eq!(t, 4.0, epsilon = 1e-4));
        assert!(relative_eq!(si.it.n.z, -1.0, epsilon = 1e-4));
    }

    #[test]
    fn respects_t_max() {
        let s = Sphere::new(Point3f::new(0.0, 0.0, 5.0), 1.0, false);
        let r = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0), 3.0, 0.0, None);

        assert!(s.intersect(&r).is_none());
    }

    #[test]
    fn cone_samples_land_on_visible_cap() {
        let s = Sphere::new(Point3f::new(0.0, 0.0, 4.0), 1.0, false);
        let refp = InteractionData::from_point(Point3f::default(), 0.0, None);

        for i in 0..16 {
            let u = Point2f::new((i as Float + 0.5) / 16.0, 0.25);
            let (it, pdf) = s.sample_ref(&refp, &u);
            assert!(pdf > 0.0);
            assert!(relative_eq!(it.p.distance(&s.center), 1.0, epsilon = 1e-4));
            assert!(it.n.dot_vec(&(refp.p - it.p)) >= -1e-4);
        }
    }
}

use std::sync::Arc;
use anyhow::{Result, anyhow};
use crate::core::pbrt::{Float, INFINITY, PI, radians};
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::point::{Point3f, Point2f};
use crate::core::geometry::ray::Ray;
use crate::core::camera::{Camera, CameraSample, CameraWiSample};
use crate::core::film::Film;
use crate::core::interaction::{Interaction, InteractionData};
use crate::core::light::VisibilityTester;
use crate::core::medium::{MediumId, MediumInterface};
use crate::core::spectrum::Spectrum;
use crate::core::sampling::concentric_sample_disk;

/// Pinhole or thin-lens camera looking along `forward`.
///
/// The field of view spans the shorter image axis. Raster x grows along
/// `right` and raster y grows against `up`.
#[derive(Debug)]
pub struct PerspectiveCamera {
    eye             : Point3f,
    right           : Vector3f,
    up              : Vector3f,
    forward         : Vector3f,
    // Screen window on the z = 1 plane
    screen_min      : Point2f,
    screen_max      : Point2f,
    lens_radius     : Float,
    focal_distance  : Float,
    // Area of the screen window
    a               : Float,
    film            : Arc<Film>,
    medium          : Option<MediumId>
}

impl PerspectiveCamera {
    pub fn new(
        eye: Point3f, look_at: Point3f, up: Vector3f, fov: Float,
        lens_radius: Float, focal_distance: Float,
        film: Arc<Film>, medium: Option<MediumId>) -> Result<Self> {
        let dir = look_at - eye;
        if dir.length_squared() == 0.0 {
            return Err(anyhow!("Camera \"eye\" and \"lookat\" points are both {}", eye));
        }

        let forward = dir.normalize();
        let right = forward.cross(&up.normalize());
        if right.length_squared() == 0.0 {
            return Err(anyhow!("Camera \"up\" vector {} is parallel to the viewing direction", up));
        }

        let right = right.normalize();
        let up = right.cross(&forward);

        let res = film.full_resolution;
        let aspect = res.x as Float / res.y as Float;
        let tan_half = (radians(fov) / 2.0).tan();
        let (sx, sy) = if aspect > 1.0 { (aspect, 1.0) } else { (1.0, 1.0 / aspect) };
        let screen_min = Point2f::new(-sx * tan_half, -sy * tan_half);
        let screen_max = Point2f::new(sx * tan_half, sy * tan_half);
        let a = (screen_max.x - screen_min.x) * (screen_max.y - screen_min.y);

        Ok(Self {
            eye, right, up, forward, screen_min, screen_max,
            lens_radius, focal_distance, a, film, medium
        })
    }

    fn lens_area(&self) -> Float {
        if self.lens_radius > 0.0 { PI * self.lens_radius * self.lens_radius } else { 1.0 }
    }

    /// Point on the z = 1 plane in camera space.
    fn raster_to_camera(&self, p: &Point2f) -> Vector3f {
        let res = self.film.full_resolution;
        let x = self.screen_min.x + p.x / res.x as Float * (self.screen_max.x - self.screen_min.x);
        let y = self.screen_max.y - p.y / res.y as Float * (self.screen_max.y - self.screen_min.y);

        Vector3f::new(x, y, 1.0)
    }

    fn camera_to_world(&self, v: &Vector3f) -> Vector3f {
        self.right * v.x + self.up * v.y + self.forward * v.z
    }

    fn world_to_camera(&self, p: &Point3f) -> Vector3f {
        let d = *p - self.eye;

        Vector3f::new(d.dot(&self.right), d.dot(&self.up), d.dot(&self.forward))
    }

    /// Raster position of the point where `ray` crosses the plane of focus,
    /// with the cosine between the ray and the viewing direction.
    fn project(&self, ray: &Ray) -> Option<(Point2f, Float)> {
        let d = ray.d.normalize();
        let cos_theta = d.dot(&self.forward);
        if cos_theta <= 0.0 { return None; }

        let dist = if self.lens_radius > 0.0 { self.focal_distance } else { 1.0 } / cos_theta;
        let q = self.world_to_camera(&(ray.o + d * dist));
        let res = self.film.full_resolution;
        let x = (q.x / q.z - self.screen_min.x) / (self.screen_max.x - self.screen_min.x) * res.x as Float;
        let y = (self.screen_max.y - q.y / q.z) / (self.screen_max.y - self.screen_min.y) * res.y as Float;

        if x < 0.0 || x >= res.x as Float || y < 0.0 || y >= res.y as Float {
            return None;
        }

        Some((Point2f::new(x, y), cos_theta))
    }
}

impl Camera for PerspectiveCamera {
    fn film(&self) -> Arc<Film> {
        self.film.clone()
    }

    fn medium(&self) -> Option<MediumId> {
        self.medium
    }

    fn forward(&self) -> Normal3f {
        Normal3f::from(self.forward)
    }

    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float) {
        let p_camera = self.raster_to_camera(&sample.p_film);
        let mut o = Vector3f::default();
        let mut d = p_camera.normalize();

        // Refocus through a point on the lens
        if self.lens_radius > 0.0 {
            let p_lens = concentric_sample_disk(&sample.p_lens) * self.lens_radius;
            let ft = self.focal_distance / d.z;
            let p_focus = d * ft;
            o = Vector3f::new(p_lens.x, p_lens.y, 0.0);
            d = (p_focus - o).normalize();
        }

        let origin = self.eye + self.camera_to_world(&o);
        let ray = Ray::new(origin, self.camera_to_world(&d), INFINITY, sample.time, self.medium);

        (ray, 1.0)
    }

    fn we(&self, ray: &Ray) -> (Spectrum, Point2f) {
        match self.project(ray) {
            Some((p_raster, cos_theta)) => {
                let cos2 = cos_theta * cos_theta;

                (Spectrum::new(1.0 / (self.a * self.lens_area() * cos2 * cos2)), p_raster)
            },
            None => (Spectrum::new(0.0), Point2f::default())
        }
    }

    fn pdf_we(&self, ray: &Ray) -> (Float, Float) {
        match self.project(ray) {
            Some((_, cos_theta)) => (
                1.0 / self.lens_area(),
                1.0 / (self.a * cos_theta * cos_theta * cos_theta)),
            None => (0.0, 0.0)
        }
    }

    fn sample_wi(&self, re: &InteractionData, u: &Point2f) -> CameraWiSample {
        let p_lens = concentric_sample_disk(u) * self.lens_radius;
        let p_lens_world = self.eye + self.right * p_lens.x + self.up * p_lens.y;
        let lens_intr = InteractionData {
            p               : p_lens_world,
            time            : re.time,
            n               : Normal3f::from(self.forward),
            medium_interface: MediumInterface::new(self.medium),
            ..Default::default()
        };

        let wi = p_lens_world - re.p;
        let dist = wi.length();
        if dist == 0.0 { return CameraWiSample::default(); }

        let wi = wi / dist;
        let pdf = dist * dist / (lens_intr.n.abs_dot_vec(&wi) * self.lens_area());
        let (we, p_raster) = self.we(&lens_intr.spawn_ray(&-wi));
        if we.is_black() || pdf.is_infinite() { return CameraWiSample::default(); }

        CameraWiSample { we, wi, pdf, p_raster, vis: VisibilityTester::new(*re, lens_intr) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use approx::relative_eq;
    use crate::core::geometry::point::Point2i;

    fn camera(lens_radius: Float) -> PerspectiveCamera {
        let film = Arc::new(Film::new(Point2i::new(8, 4), PathBuf::from("t.png")));

        PerspectiveCamera::new(
            Point3f::new(0.0, 0.0, 5.0), Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0),
            45.0, lens_radius, 5.0, film, None).unwrap()
    }

    #[test]
    fn center_ray_looks_forward() {
        let cam = camera(0.0);
        let s = CameraSample { p_film: Point2f::new(4.0, 2.0), ..Default::default() };
        let (r, w) = cam.generate_ray(&s);

        assert_eq!(w, 1.0);
        assert!(relative_eq!(r.d.z, -1.0, max_relative = 1e-5));
    }

    #[test]
    fn raster_x_grows_to_the_right() {
        let cam = camera(0.0);
        let s = CameraSample { p_film: Point2f::new(7.5, 0.5), ..Default::default() };
        let (r, _) = cam.generate_ray(&s);

        assert!(r.d.x > 0.0);
        assert!(r.d.y > 0.0);
    }

    #[test]
    fn we_inverts_generate_ray() {
        for lens in [0.0, 0.2].iter() {
            let cam = camera(*lens);
            let s = CameraSample {
                p_film: Point2f::new(2.25, 3.5),
                p_lens: Point2f::new(0.3, 0.7),
                time: 0.0
            };
            let (r, _) = cam.generate_ray(&s);
            let (we, p_raster) = cam.we(&r);

            assert!(!we.is_black());
            assert!(relative_eq!(p_raster.x, 2.25, max_relative = 1e-3));
            assert!(relative_eq!(p_raster.y, 3.5, max_relative = 1e-3));
        }
    }

    #[test]
    fn importance_is_zero_behind_the_camera() {
        let cam = camera(0.0);
        let r = Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, 1.0), INFINITY, 0.0, None);

        assert!(cam.we(&r).0.is_black());
        assert_eq!(cam.pdf_we(&r), (0.0, 0.0));
    }

    #[test]
    fn sample_wi_reaches_the_lens() {
        let cam = camera(0.0);
        let re = InteractionData::from_point(Point3f::new(0.1, -0.2, 0.0), 0.0, None);
        let s = cam.sample_wi(&re, &Point2f::new(0.5, 0.5));

        assert!(s.pdf > 0.0);
        assert!(s.wi.z > 0.0);
        assert!(s.p_raster.x >= 0.0 && s.p_raster.x < 8.0);
    }
}

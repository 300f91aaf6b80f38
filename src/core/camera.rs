use std::sync::Arc;
use enum_dispatch::enum_dispatch;
use crate::core::geometry::point::Point2f;
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::ray::Ray;
use crate::core::interaction::InteractionData;
use crate::core::light::VisibilityTester;
use crate::core::medium::MediumId;
use crate::core::spectrum::Spectrum;
use crate::core::pbrt::Float;
use crate::core::film::Film;
use crate::cameras::perspective::PerspectiveCamera;

/// Film position (raster space), lens position and time for one camera ray.
#[derive(Debug, Default, Copy, Clone)]
pub struct CameraSample {
    pub p_film  : Point2f,
    pub p_lens  : Point2f,
    pub time    : Float
}

/// Importance arriving at a reference point from the lens. A zero `pdf`
/// marks a failed sample.
#[derive(Debug, Default, Copy, Clone)]
pub struct CameraWiSample {
    pub we      : Spectrum,
    pub wi      : Vector3f,
    pub pdf     : Float,
    pub p_raster: Point2f,
    pub vis     : VisibilityTester
}

#[enum_dispatch(Cameras)]
pub trait Camera {
    fn film(&self) -> Arc<Film>;

    fn medium(&self) -> Option<MediumId>;

    /// Viewing direction, used as the normal of points on the lens.
    fn forward(&self) -> Normal3f;

    /// World-space ray for the sample, with its weight.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float);

    /// Importance carried by `ray` leaving the lens, with the raster point it
    /// maps to. Zero if the ray misses the film.
    fn we(&self, ray: &Ray) -> (Spectrum, Point2f);

    /// Returns (pdf_pos, pdf_dir) of generating `ray`.
    fn pdf_we(&self, ray: &Ray) -> (Float, Float);

    fn sample_wi(&self, re: &InteractionData, u: &Point2f) -> CameraWiSample;
}

#[enum_dispatch]
#[derive(Debug)]
pub enum Cameras {
    PerspectiveCamera
}

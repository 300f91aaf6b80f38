use enum_dispatch::enum_dispatch;
use crate::core::interaction::{Interaction, InteractionData};
use crate::core::scene::Scene;
use crate::core::sampler::Samplers;
use crate::core::spectrum::Spectrum;
use crate::core::primitive::Primitive;
use crate::core::medium::Medium;
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::point::Point2f;
use crate::core::geometry::normal::Normal3f;
use crate::core::pbrt::Float;
use crate::lights::diffuse::DiffuseAreaLight;
use crate::lights::point::PointLight;
use crate::lights::infinite::UniformInfiniteLight;

#[repr(u8)]
pub enum LightFlags {
    DeltaPosition   = 1,
    DeltaDirection  = 2,
    Area            = 4,
    Infinite        = 8
}

#[inline]
pub fn is_delta_light(flags: u8) -> bool {
    (flags & LightFlags::DeltaPosition as u8) > 0 ||
    (flags & LightFlags::DeltaDirection as u8) > 0
}

/// Incident radiance sampled toward a reference point. A zero `pdf` marks
/// a failed sample.
#[derive(Debug, Default, Copy, Clone)]
pub struct LightLiSample {
    pub li  : Spectrum,
    pub wi  : Vector3f,
    pub pdf : Float,
    pub vis : VisibilityTester
}

/// Ray leaving the light with its position and direction densities.
#[derive(Debug, Default, Copy, Clone)]
pub struct LightLeSample {
    pub le      : Spectrum,
    pub ray     : Ray,
    pub n_light : Normal3f,
    pub pdf_pos : Float,
    pub pdf_dir : Float
}

#[enum_dispatch]
pub trait Light {
    fn flags(&self) -> u8;

    /// Total emitted power.
    fn power(&self) -> Spectrum;

    /// Called once the scene extent is known.
    fn preprocess(&mut self, _world_bound: &Bounds3f) {}

    /// Radiance carried by a ray that escapes the scene.
    fn le(&self, _r: &Ray) -> Spectrum {
        Spectrum::new(0.0)
    }

    /// Radiance emitted from a point on an area light toward `w`.
    fn l(&self, _it: &InteractionData, _w: &Vector3f) -> Spectrum {
        Spectrum::new(0.0)
    }

    fn sample_li(&self, re: &InteractionData, u: &Point2f) -> LightLiSample;

    fn pdf_li(&self, re: &InteractionData, wi: &Vector3f) -> Float;

    fn sample_le(&self, u1: &Point2f, u2: &Point2f, time: Float) -> LightLeSample;

    /// Returns (pdf_pos, pdf_dir) for an emitted ray leaving a point with normal `n_light`.
    fn pdf_le(&self, ray: &Ray, n_light: &Normal3f) -> (Float, Float);
}

#[enum_dispatch(Light)]
#[derive(Debug, Clone)]
pub enum Lights {
    DiffuseAreaLight,
    PointLight,
    UniformInfiniteLight
}

/// Segment between two points whose visibility is tested lazily, only once
/// the contribution it gates turns out to be non-zero.
#[derive(Debug, Default, Copy, Clone)]
pub struct VisibilityTester {
    p0: InteractionData,
    p1: InteractionData
}

impl VisibilityTester {
    pub fn new(p0: InteractionData, p1: InteractionData) -> Self {
        Self { p0, p1 }
    }

    pub fn p0(&self) -> &InteractionData {
        &self.p0
    }

    pub fn p1(&self) -> &InteractionData {
        &self.p1
    }

    pub fn unoccluded(&self, scene: &Scene) -> bool {
        !scene.intersect_p(&self.p0.spawn_ray_to(&self.p1))
    }

    /// Transmittance between the endpoints. Surfaces without a material
    /// (medium boundaries) are passed through, any other surface blocks.
    pub fn tr(&self, scene: &Scene, sampler: &mut Samplers) -> Spectrum {
        let mut ray = self.p0.spawn_ray_to(&self.p1);
        let mut tr = Spectrum::new(1.0);

        loop {
            let isect = scene.intersect(&mut ray);

            if let Some(ref si) = isect {
                let opaque = si.primitive
                    .map(|idx| scene.aggregate.primitive(idx).material().is_some())
                    .unwrap_or(true);
                if opaque { return Spectrum::new(0.0); }
            }

            if let Some(m) = ray.medium {
                tr *= scene.medium(m).tr(&ray, sampler);
            }

            match isect {
                Some(si) => ray = si.spawn_ray_to(&self.p1),
                None     => break
            }
        }

        tr
    }
}

use crate::core::geometry::point::{Point3f, Point2f};
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::geometry::offset_ray_origin;
use crate::core::geometry::ray::Ray;
use crate::core::pbrt::{Float, INFINITY, SHADOW_EPSILON};
use crate::core::medium::{MediumInterface, MediumId, PhaseFunctions};
use crate::core::reflection::BSDF;
use crate::core::material::TransportMode;
use crate::core::primitive::Primitive;
use crate::core::light::Light;
use crate::core::spectrum::Spectrum;
use crate::core::scene::Scene;

pub trait Interaction {
    fn p(&self) -> Point3f;
    fn time(&self) -> Float;
    fn p_error(&self) -> Vector3f;
    fn wo(&self) -> Vector3f;
    fn n(&self) -> Normal3f;
    fn medium_interface(&self) -> MediumInterface;

    fn spawn_ray(&self, d: &Vector3f) -> Ray {
        let o = offset_ray_origin(&self.p(), &self.p_error(), &self.n(), d);

        Ray::new(o, *d, INFINITY, self.time(), self.get_medium_vec(d))
    }

    fn spawn_ray_to_point(&self, p2: &Point3f) -> Ray {
        let o = offset_ray_origin(&self.p(), &self.p_error(), &self.n(), &(*p2 - self.p()));
        let d = *p2 - o;

        Ray::new(o, d, 1.0 - SHADOW_EPSILON, self.time(), self.get_medium_vec(&d))
    }

    fn spawn_ray_to<I: Interaction>(&self, it: &I) -> Ray {
        let o = offset_ray_origin(&self.p(), &self.p_error(), &self.n(), &(it.p() - self.p()));
        let t = offset_ray_origin(&it.p(), &it.p_error(), &it.n(), &(o - it.p()));
        let d = t - o;

        Ray::new(o, d, 1.0 - SHADOW_EPSILON, self.time(), self.get_medium_vec(&d))
    }

    /// Medium on the side of the interaction that `w` points into.
    fn get_medium_vec(&self, w: &Vector3f) -> Option<MediumId> {
        let mi = self.medium_interface();

        if self.is_surface_interaction() && w.dot_norm(&self.n()) <= 0.0 {
            mi.inside
        } else if self.is_surface_interaction() {
            mi.outside
        } else {
            mi.inside
        }
    }

    fn get_medium(&self) -> Option<MediumId> {
        self.medium_interface().inside
    }

    fn is_surface_interaction(&self) -> bool {
        !self.n().is_zero()
    }

    fn is_medium_interaction(&self) -> bool {
        !self.is_surface_interaction()
    }
}

/// Position-only description of a point on a surface, in a medium or on a
/// light or camera. A zero normal marks a point that is not on a surface.
#[derive(Debug, Default, Copy, Clone)]
pub struct InteractionData {
    pub p                   : Point3f,
    pub time                : Float,
    pub p_error             : Vector3f,
    pub wo                  : Vector3f,
    pub n                   : Normal3f,
    pub medium_interface    : MediumInterface
}

impl InteractionData {
    pub fn new(
        p: Point3f, n: Normal3f, p_error: Vector3f, wo: Vector3f,
        time: Float, medium_interface: MediumInterface) -> Self {
        let wo = if wo.length_squared() > 0.0 { wo.normalize() } else { wo };

        Self { p, time, p_error, wo, n, medium_interface }
    }

    pub fn from_point(p: Point3f, time: Float, medium: Option<MediumId>) -> Self {
        Self { p, time, medium_interface: MediumInterface::new(medium), ..Default::default() }
    }
}

impl Interaction for InteractionData {
    fn p(&self) -> Point3f { self.p }
    fn time(&self) -> Float { self.time }
    fn p_error(&self) -> Vector3f { self.p_error }
    fn wo(&self) -> Vector3f { self.wo }
    fn n(&self) -> Normal3f { self.n }
    fn medium_interface(&self) -> MediumInterface { self.medium_interface }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct Shading {
    pub n   : Normal3f,
    pub dpdu: Vector3f
}

#[derive(Debug, Default, Clone)]
pub struct SurfaceInteraction {
    pub it          : InteractionData,
    pub uv          : Point2f,
    pub dpdu        : Vector3f,
    pub shading     : Shading,
    /// Index of the hit primitive in the scene aggregate.
    pub primitive   : Option<usize>,
    pub bsdf        : Option<BSDF>
}

impl SurfaceInteraction {
    pub fn new(
        p: Point3f, p_error: Vector3f, uv: Point2f, wo: Vector3f,
        dpdu: Vector3f, n: Normal3f, time: Float) -> Self {
        Self {
            it: InteractionData::new(p, n, p_error, wo, time, MediumInterface::default()),
            uv,
            dpdu,
            shading: Shading { n, dpdu },
            primitive: None,
            bsdf: None
        }
    }

    /// Asks the hit primitive's material to fill in `bsdf`. Surfaces without
    /// a material (medium boundaries) are left with none.
    pub fn compute_scattering_functions(&mut self, scene: &Scene, mode: TransportMode) {
        if let Some(idx) = self.primitive {
            let prim = scene.aggregate.primitive(idx);
            prim.compute_scattering_functions(self, mode);
        }
    }

    /// Radiance emitted from the surface toward `w` if it is an area light.
    pub fn le(&self, w: &Vector3f, scene: &Scene) -> Spectrum {
        self.primitive
            .and_then(|idx| scene.aggregate.primitive(idx).area_light())
            .map(|l| scene.lights[l].l(&self.it, w))
            .unwrap_or_default()
    }
}

impl Interaction for SurfaceInteraction {
    fn p(&self) -> Point3f { self.it.p }
    fn time(&self) -> Float { self.it.time }
    fn p_error(&self) -> Vector3f { self.it.p_error }
    fn wo(&self) -> Vector3f { self.it.wo }
    fn n(&self) -> Normal3f { self.it.n }
    fn medium_interface(&self) -> MediumInterface { self.it.medium_interface }
}

/// Scattering point inside a participating medium.
#[derive(Debug, Copy, Clone)]
pub struct MediumInteraction {
    pub it      : InteractionData,
    pub phase   : PhaseFunctions
}

impl MediumInteraction {
    pub fn new(p: Point3f, wo: Vector3f, time: Float, medium: Option<MediumId>, phase: PhaseFunctions) -> Self {
        Self {
            it: InteractionData::new(
                p, Normal3f::default(), Vector3f::default(), wo, time, MediumInterface::new(medium)),
            phase
        }
    }
}

impl Interaction for MediumInteraction {
    fn p(&self) -> Point3f { self.it.p }
    fn time(&self) -> Float { self.it.time }
    fn p_error(&self) -> Vector3f { self.it.p_error }
    fn wo(&self) -> Vector3f { self.it.wo }
    fn n(&self) -> Normal3f { self.it.n }
    fn medium_interface(&self) -> MediumInterface { self.it.medium_interface }
}

/// Borrowed view of a point where light scatters, on a surface or inside a medium.
#[derive(Debug, Copy, Clone)]
pub enum Interactions<'a> {
    Surface(&'a SurfaceInteraction),
    Medium(&'a MediumInteraction)
}

impl<'a> Interactions<'a> {
    pub fn data(&self) -> &'a InteractionData {
        match *self {
            Interactions::Surface(si) => &si.it,
            Interactions::Medium(mi)  => &mi.it
        }
    }
}

impl<'a> Interaction for Interactions<'a> {
    fn p(&self) -> Point3f { self.data().p }
    fn time(&self) -> Float { self.data().time }
    fn p_error(&self) -> Vector3f { self.data().p_error }
    fn wo(&self) -> Vector3f { self.data().wo }
    fn n(&self) -> Normal3f { self.data().n }
    fn medium_interface(&self) -> MediumInterface { self.data().medium_interface }
}

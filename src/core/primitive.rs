use std::sync::Arc;
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::interaction::SurfaceInteraction;
use crate::core::material::{Material, Materials, TransportMode};
use crate::core::shape::{Shape, Shapes};
use crate::core::medium::MediumInterface;

pub trait Primitive {
    fn world_bound(&self) -> Bounds3f;

    /// Closest hit along `r`. On a hit `r.t_max` is shortened to the hit distance.
    fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction>;

    fn intersect_p(&self, r: &Ray) -> bool;

    fn material(&self) -> Option<Arc<Materials>>;

    /// Index of the area light attached to this primitive in the scene light list.
    fn area_light(&self) -> Option<usize>;

    fn compute_scattering_functions(&self, isect: &mut SurfaceInteraction, mode: TransportMode);
}

#[derive(Debug, Clone)]
pub struct GeometricPrimitive {
    shape               : Arc<Shapes>,
    material            : Option<Arc<Materials>>,
    area_light          : Option<usize>,
    medium_interface    : MediumInterface
}

impl GeometricPrimitive {
    pub fn new(
        shape: Arc<Shapes>, material: Option<Arc<Materials>>,
        area_light: Option<usize>, medium_interface: MediumInterface) -> Self {
        Self { shape, material, area_light, medium_interface }
    }

    pub fn shape(&self) -> &Arc<Shapes> {
        &self.shape
    }
}

impl Primitive for GeometricPrimitive {
    fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }

    fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction> {
        let (thit, mut isect) = self.shape.intersect(r)?;
        r.t_max = thit;

        // Surfaces that do not separate two media inherit the ray's medium
        isect.it.medium_interface = if self.medium_interface.is_medium_transition() {
            self.medium_interface
        } else {
            MediumInterface::new(r.medium)
        };

        Some(isect)
    }

    fn intersect_p(&self, r: &Ray) -> bool {
        self.shape.intersect_p(r)
    }

    fn material(&self) -> Option<Arc<Materials>> {
        self.material.clone()
    }

    fn area_light(&self) -> Option<usize> {
        self.area_light
    }

    fn compute_scattering_functions(&self, isect: &mut SurfaceInteraction, mode: TransportMode) {
        if let Some(ref m) = self.material {
            m.compute_scattering_functions(isect, mode);
        }
    }
}

use std::sync::Arc;
use crate::core::light::{Light, Lights, LightFlags};
use crate::core::geometry::bounds::Bounds3f;
use crate::core::medium::{Medium, MediumId, Mediums};
use crate::core::primitive::Primitive;
use crate::core::sampler::Samplers;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::vector::Vector3f;
use crate::core::interaction::{Interaction, SurfaceInteraction};
use crate::core::spectrum::Spectrum;
use crate::accelerators::bvh::BVHAccel;

stat_counter!("Intersections/Regular ray intersection tests", nintersection_tests);
stat_counter!("Intersections/Shadow ray intersection tests", nshadow_tests);

pub fn init_stats() {
    nintersection_tests::init();
    nshadow_tests::init();
}

/// Geometry, emitters and participating media of a render.
pub struct Scene {
    pub lights          : Vec<Arc<Lights>>,
    /// Indices into `lights` of the lights seen by escaping rays.
    pub infinite_lights : Vec<usize>,
    pub aggregate       : BVHAccel,
    pub media           : Vec<Mediums>,
    // world bound
    pub wb              : Bounds3f
}

impl Scene {
    pub fn new(aggregate: BVHAccel, lights: Vec<Lights>, media: Vec<Mediums>) -> Self {
        let wb = aggregate.world_bound();
        let mut infinite_lights = Vec::new();

        let lights = lights
            .into_iter()
            .enumerate()
            .map(|(i, mut light)| {
                light.preprocess(&wb);
                if (light.flags() & LightFlags::Infinite as u8) != 0 {
                    infinite_lights.push(i);
                }

                Arc::new(light)
            })
            .collect();

        Self { lights, infinite_lights, aggregate, media, wb }
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.wb
    }

    pub fn lights(&self) -> &[Arc<Lights>] {
        &self.lights
    }

    pub fn medium(&self, id: MediumId) -> &Mediums {
        &self.media[id.0]
    }

    pub fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction> {
        nintersection_tests::inc();
        debug_assert_ne!(r.d, Vector3f::new(0.0, 0.0, 0.0));

        self.aggregate.intersect(r)
    }

    pub fn intersect_p(&self, r: &Ray) -> bool {
        nshadow_tests::inc();
        debug_assert_ne!(r.d, Vector3f::new(0.0, 0.0, 0.0));

        self.aggregate.intersect_p(r)
    }

    /// Closest surface with a material along `ray`, skipping medium
    /// boundaries, with the beam transmittance up to it.
    pub fn intersect_tr(&self, mut ray: Ray, sampler: &mut Samplers) -> (Option<SurfaceInteraction>, Spectrum) {
        let mut tr = Spectrum::new(1.0);

        loop {
            let hit = self.intersect(&mut ray);

            // Accumulate beam transmittance for ray segment
            if let Some(m) = ray.medium {
                tr *= self.medium(m).tr(&ray, sampler);
            }

            let isect = match hit {
                Some(isect) => isect,
                None        => return (None, tr)
            };

            let has_material = isect.primitive
                .map(|idx| self.aggregate.primitive(idx).material().is_some())
                .unwrap_or(false);
            if has_material { return (Some(isect), tr); }

            ray = isect.spawn_ray(&ray.d);
        }
    }
}

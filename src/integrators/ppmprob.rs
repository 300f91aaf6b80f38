use std::sync::Arc;
use anyhow::Result;
use log::{debug, info};
use crate::core::camera::{Camera, Cameras};
use crate::core::geometry::point::Point2i;
use crate::core::geometry::ray::Ray;
use crate::core::integrator::{
    Integrator, RenderControl, count_camera_ray, create_light_sample_distribution,
    finish_progress_bar, iteration_seed, pass_progress_bar, uniform_sample_one_light, write_iteration};
use crate::core::interaction::{Interaction, Interactions};
use crate::core::light::Light;
use crate::core::material::TransportMode;
use crate::core::medium::{Medium, PhaseFunction};
use crate::core::params::RenderParams;
use crate::core::parallel::{ParallelScheduler, PerThread, Schedule};
use crate::core::pbrt::Float;
use crate::core::reflection::{BxDFType, is_diffuse_reflection, is_specular};
use crate::core::sampler::{Sampler, Samplers};
use crate::core::sampling::Distribution1D;
use crate::core::scene::Scene;
use crate::core::spectrum::Spectrum;
use crate::samplers::random::RandomSampler;
use super::photonmap::{PhotonMap, PhotonTracer, photon_seed};
use super::radius::RadiusController;

/// Probabilistic progressive photon mapping.
///
/// Every iteration shoots a fresh photon map, traces one camera path per
/// pixel with next event estimation and ends the path at the first diffuse
/// reflection with a density estimate. The gather radius shrinks after
/// each iteration.
pub struct PPMProbIntegrator {
    camera      : Arc<Cameras>,
    params      : RenderParams,
    radius      : RadiusController,
    photon_map  : PhotonMap
}

impl PPMProbIntegrator {
    pub fn new(camera: Arc<Cameras>, params: RenderParams) -> Self {
        let radius = RadiusController::new(params.radius_mode, params.lookup_radius_ratio);

        Self { camera, params, radius, photon_map: PhotonMap::default() }
    }

    pub fn radius(&self) -> &RadiusController {
        &self.radius
    }

    pub fn li(
        &self, ray: Ray, scene: &Scene, sampler: &mut Samplers,
        light_distr: &Distribution1D, radius: Float) -> GatherSample {
        gather_li(ray, scene, sampler, light_distr, &self.photon_map, &self.params, radius)
    }
}

/// Radiance carried by one camera path of the gathering integrators.
#[derive(Debug, Default, Copy, Clone)]
pub struct GatherSample {
    pub l               : Spectrum,
    /// Part of `l` added by light sampling at path vertices.
    pub direct          : Spectrum,
    /// Whether the density estimate found any photon.
    pub found_photons   : bool
}

/// Camera path with next event estimation that ends at the first diffuse
/// reflection with a density estimate from `photon_map`.
pub fn gather_li(
    mut ray: Ray, scene: &Scene, sampler: &mut Samplers, light_distr: &Distribution1D,
    photon_map: &PhotonMap, params: &RenderParams, radius: Float) -> GatherSample {
    let mut l = Spectrum::new(0.0);
    let mut direct = Spectrum::new(0.0);
    let mut beta = Spectrum::new(1.0);
    let mut specular_bounce = false;
    let mut found_photons = false;
    let has_media = !scene.media.is_empty();
    let non_specular = BxDFType::All as u8 & !(BxDFType::Specular as u8);
    let mut bounces = 0;

    loop {
        let hit = scene.intersect(&mut ray);

        // Sample the participating medium, if present
        let mut mi = None;
        if let Some(m) = ray.medium {
            let (tr, sampled) = scene.medium(m).sample(&ray, sampler);
            beta *= tr;
            mi = sampled;
        }
        if beta.is_black() { break; }

        if let Some(ref mi) = mi {
            let ld = beta * uniform_sample_one_light(
                Interactions::Medium(mi), scene, sampler, true, Some(light_distr));
            l += ld;
            direct += ld;
            if bounces >= params.max_depth { break; }

            let (_, wi) = mi.phase.sample_p(&-ray.d, &sampler.get_2d());
            ray = mi.spawn_ray(&wi);
            specular_bounce = false;
            bounces += 1;
            continue;
        }

        // Add emitted light at path vertex or from the environment
        if bounces == 0 || specular_bounce {
            match hit {
                Some(ref isect) => l += beta * isect.le(&-ray.d, scene),
                None => for light in scene.lights.iter() {
                    l += beta * light.le(&ray);
                }
            }
        }

        let mut isect = match hit {
            Some(isect) if bounces < params.max_depth => isect,
            _ => break
        };

        // Skip over medium boundaries without counting a bounce
        isect.compute_scattering_functions(scene, TransportMode::Radiance);
        let bsdf = match isect.bsdf {
            Some(ref b) => b,
            None        => {
                ray = isect.spawn_ray(&ray.d);
                continue;
            }
        };

        let ld = if bsdf.num_components(non_specular) > 0 {
            beta * uniform_sample_one_light(
                Interactions::Surface(&isect), scene, sampler, has_media, Some(light_distr))
        } else {
            Spectrum::new(0.0)
        };

        let wo = isect.it.wo;
        let s = bsdf.sample_f(&wo, &sampler.get_2d(), BxDFType::All as u8);
        if s.f.is_black() || s.pdf == 0.0 { break; }

        // Diffuse reflections end the path with a density estimate
        if is_diffuse_reflection(s.sampled_type) {
            let est = photon_map.estimate(&isect, params.gather_photons, radius);
            found_photons = est.nphotons > 0;
            l += beta * est.l;
            break;
        }
        l += ld;
        direct += ld;

        beta *= s.f * s.wi.abs_dot_norm(&isect.shading.n) / s.pdf;
        specular_bounce = is_specular(s.sampled_type);
        ray = isect.spawn_ray(&s.wi);

        // Possibly terminate the path with Russian roulette
        if bounces > params.rr_depth {
            let q = beta.y().min(0.95);
            if sampler.get_1d() > q { break; }
            beta /= q;
        }

        bounces += 1;
    }

    GatherSample { l, direct, found_photons }
}

impl Integrator for PPMProbIntegrator {
    fn render(&mut self, scene: &Scene, scheduler: &ParallelScheduler, control: &RenderControl) -> Result<usize> {
        let params = self.params.clone();
        let film = self.camera.film();
        let res = film.full_resolution;
        let npixels = film.num_pixels();

        // Compute light distribution and starting radius
        let light_distr = create_light_sample_distribution(params.light_sample_strategy, scene)?;
        let r0 = RadiusController::initial_radius(&params, &scene.world_bound());
        self.radius.initialize(r0, npixels);
        info!("Progressive photon mapping: {} pixels, initial radius {}", npixels, r0);

        let prototype: Samplers = RandomSampler::new(params.seed).into();
        let mut samplers = PerThread::new(scheduler, |_| prototype.clone_with_seed(params.seed));
        let mut completed = 0;

        for i in 0..params.sample_count {
            if control.stop_requested() {
                info!("Stop requested, finishing after {} iterations", completed);
                break;
            }

            // Shoot photons for this iteration
            let seed = iteration_seed(params.seed, i);
            for s in samplers.iter_mut() { *s = prototype.clone_with_seed(photon_seed(seed)); }
            let tracer = PhotonTracer {
                scene,
                light_distr: &light_distr,
                max_depth: params.max_depth,
                rr_depth: params.rr_depth
            };
            let photons = tracer.trace(scheduler, &samplers, params.photon_count);
            self.photon_map.construct(photons);
            info!(
                "Iteration {}/{}: radius {}, {} photons stored",
                i + 1, params.sample_count, self.radius.max_radius(), self.photon_map.len());

            // Trace one camera path per pixel
            for s in samplers.iter_mut() { *s = prototype.clone_with_seed(seed); }
            let pb = pass_progress_bar(npixels, &format!("Iteration {}/{}", i + 1, params.sample_count));
            let radius = self.radius.snapshot();
            let camera = &self.camera;
            let this = &*self;

            scheduler.parallel_for(0, npixels, Schedule::Dynamic, |pid| {
                let mut sampler = samplers.get(scheduler);
                sampler.start_pixel(pid as u64);

                let pixel = Point2i::new((pid % res.x as usize) as i32, (pid / res.x as usize) as i32);
                let cs = sampler.get_camera_sample(&pixel);
                let (ray, weight) = camera.generate_ray(&cs);
                count_camera_ray();

                if weight > 0.0 {
                    let g = this.li(ray, scene, &mut sampler, &light_distr, radius.radius(pid));
                    if g.found_photons { radius.record_hit(pid); }
                    debug!("Pixel {} L = {}", pixel, g.l);
                    film.add_sample(&pixel, g.l * weight);
                }

                pb.inc(1);
            });
            finish_progress_bar(&pb);

            write_iteration(&film, &params, i)?;
            self.radius.decay();
            completed += 1;
        }

        Ok(completed)
    }
}

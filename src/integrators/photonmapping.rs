use std::sync::Arc;
use anyhow::Result;
use log::info;
use crate::core::camera::{Camera, Cameras};
use crate::core::geometry::point::Point2i;
use crate::core::integrator::{
    Integrator, RenderControl, count_camera_ray, create_light_sample_distribution,
    finish_progress_bar, iteration_seed, pass_progress_bar, write_iteration};
use crate::core::params::RenderParams;
use crate::core::parallel::{ParallelScheduler, PerThread, Schedule};
use crate::core::sampler::{Sampler, Samplers};
use crate::core::scene::Scene;
use crate::samplers::random::RandomSampler;
use super::photonmap::{PhotonMap, PhotonTracer, photon_seed};
use super::ppmprob::gather_li;
use super::radius::RadiusController;

/// Non-progressive photon mapping: one global photon map shot up front and
/// a fixed gather radius for every pass.
pub struct PhotonMapIntegrator {
    camera      : Arc<Cameras>,
    params      : RenderParams,
    photon_map  : PhotonMap
}

impl PhotonMapIntegrator {
    pub fn new(camera: Arc<Cameras>, params: RenderParams) -> Self {
        Self { camera, params, photon_map: PhotonMap::default() }
    }

    pub fn photon_map(&self) -> &PhotonMap {
        &self.photon_map
    }
}

impl Integrator for PhotonMapIntegrator {
    fn render(&mut self, scene: &Scene, scheduler: &ParallelScheduler, control: &RenderControl) -> Result<usize> {
        let params = self.params.clone();
        let film = self.camera.film();
        let res = film.full_resolution;
        let npixels = film.num_pixels();

        let light_distr = create_light_sample_distribution(params.light_sample_strategy, scene)?;
        let radius = RadiusController::initial_radius(&params, &scene.world_bound());

        // Shoot the global photon map once
        let prototype: Samplers = RandomSampler::new(params.seed).into();
        let mut samplers = PerThread::new(scheduler, |_| prototype.clone_with_seed(photon_seed(params.seed)));
        let tracer = PhotonTracer {
            scene,
            light_distr: &light_distr,
            max_depth: params.max_depth,
            rr_depth: params.rr_depth
        };
        let photons = tracer.trace(scheduler, &samplers, params.photon_count);
        self.photon_map.construct(photons);
        info!(
            "Photon mapping: {} pixels, gather radius {}, {} photons stored",
            npixels, radius, self.photon_map.len());

        let mut completed = 0;
        for i in 0..params.sample_count {
            if control.stop_requested() {
                info!("Stop requested, finishing after {} passes", completed);
                break;
            }

            let seed = iteration_seed(params.seed, i);
            for s in samplers.iter_mut() { *s = prototype.clone_with_seed(seed); }
            let pb = pass_progress_bar(npixels, &format!("Pass {}/{}", i + 1, params.sample_count));
            let camera = &self.camera;
            let photon_map = &self.photon_map;

            scheduler.parallel_for(0, npixels, Schedule::Dynamic, |pid| {
                let mut sampler = samplers.get(scheduler);
                sampler.start_pixel(pid as u64);

                let pixel = Point2i::new((pid % res.x as usize) as i32, (pid / res.x as usize) as i32);
                let cs = sampler.get_camera_sample(&pixel);
                let (ray, weight) = camera.generate_ray(&cs);
                count_camera_ray();

                if weight > 0.0 {
                    let g = gather_li(ray, scene, &mut sampler, &light_distr, photon_map, &params, radius);
                    film.add_sample(&pixel, g.l * weight);
                }

                pb.inc(1);
            });
            finish_progress_bar(&pb);

            info!("Pass {}/{}: radius {}", i + 1, params.sample_count, radius);
            write_iteration(&film, &params, i)?;
            completed += 1;
        }

        Ok(completed)
    }
}

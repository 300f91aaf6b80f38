use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::{Result, bail, anyhow};
use enum_dispatch::enum_dispatch;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use crate::core::scene::Scene;
use crate::core::camera::Cameras;
use crate::core::film::Film;
use crate::core::params::RenderParams;
use crate::core::parallel::ParallelScheduler;
use crate::core::pbrt::{Float, mix_bits, set_progress_bar};
use crate::core::sampler::{Sampler, Samplers};
use crate::core::sampling::{Distribution1D, power_heuristic};
use crate::core::spectrum::Spectrum;
use crate::core::light::{Light, is_delta_light};
use crate::core::medium::PhaseFunction;
use crate::core::primitive::Primitive;
use crate::core::reflection::{BxDFType, is_specular};
use crate::core::interaction::{Interaction, Interactions};
use crate::core::geometry::point::Point2f;
use crate::integrators::ppmprob::PPMProbIntegrator;
use crate::integrators::vcm::VCMIntegrator;
use crate::integrators::photonmapping::PhotonMapIntegrator;

stat_counter!("Integrator/Camera rays traced", ncamera_rays);

pub fn init_stats() {
    ncamera_rays::init();
}

pub fn count_camera_ray() {
    ncamera_rays::inc();
}

/// How the light that starts a light path or a shadow ray is picked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightSampleStrategy {
    /// Proportional to emitted power.
    Power,
    Uniform
}

impl FromStr for LightSampleStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "power"   => Ok(LightSampleStrategy::Power),
            "uniform" => Ok(LightSampleStrategy::Uniform),
            other     => Err(anyhow!(
                "Light sample distribution type \"{}\" unknown for \"lightSampleStrategy\"", other))
        }
    }
}

impl Display for LightSampleStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LightSampleStrategy::Power   => write!(f, "power"),
            LightSampleStrategy::Uniform => write!(f, "uniform")
        }
    }
}

pub fn compute_light_power_distribution(scene: &Scene) -> Option<Distribution1D> {
    if scene.lights.is_empty() { return None; }

    let light_power = scene.lights.iter().map(|l| l.power().y()).collect();

    Some(Distribution1D::new(light_power))
}

pub fn create_light_sample_distribution(strategy: LightSampleStrategy, scene: &Scene) -> Result<Distribution1D> {
    if scene.lights.is_empty() {
        bail!("Scene has no lights; nothing to render");
    }

    let distrib = match strategy {
        LightSampleStrategy::Power   => compute_light_power_distribution(scene),
        LightSampleStrategy::Uniform => Some(Distribution1D::new(vec![1.0; scene.lights.len()]))
    };

    distrib.ok_or_else(|| anyhow!("Failed to build \"{}\" light distribution", strategy))
}

/// Direct lighting at `it` from one light picked from `light_distrib`, or
/// uniformly when none is given.
pub fn uniform_sample_one_light(
    it: Interactions, scene: &Scene, sampler: &mut Samplers,
    handle_media: bool, light_distrib: Option<&Distribution1D>) -> Spectrum {
    let nlights = scene.lights.len();
    if nlights == 0 { return Spectrum::new(0.0); }

    let (light_num, light_pdf) = match light_distrib {
        Some(d) => d.sample_discrete(sampler.get_1d()),
        None    => {
            let n = ((sampler.get_1d() * nlights as Float) as usize).min(nlights - 1);
            (n, 1.0 / nlights as Float)
        }
    };
    if light_pdf == 0.0 { return Spectrum::new(0.0); }

    let ulight = sampler.get_2d();
    let uscattering = sampler.get_2d();

    estimate_direct(it, &uscattering, light_num, &ulight, scene, sampler, handle_media, false) / light_pdf
}

/// One light sample and one BSDF or phase sample toward light `light_num`,
/// combined with the power heuristic.
#[allow(clippy::too_many_arguments)]
pub fn estimate_direct(
    it: Interactions, uscatt: &Point2f, light_num: usize, ulight: &Point2f,
    scene: &Scene, sampler: &mut Samplers, handle_media: bool, specular: bool) -> Spectrum {
    let bsdf_flags = if specular {
        BxDFType::All as u8
    } else {
        BxDFType::All as u8 & !(BxDFType::Specular as u8)
    };
    let light = &scene.lights[light_num];
    let mut ld = Spectrum::new(0.0);

    // Sample light source with multiple importance sampling
    let ls = light.sample_li(it.data(), ulight);
    debug!("EstimateDirect uLight {} -> Li: {}, wi: {}, pdf: {}", ulight, ls.li, ls.wi, ls.pdf);

    if ls.pdf > 0.0 && !ls.li.is_black() {
        // Compute BSDF or phase function's value for light sample
        let (f, scattering_pdf) = match it {
            Interactions::Surface(si) => match si.bsdf {
                Some(ref bsdf) => (
                    bsdf.f(&si.it.wo, &ls.wi, bsdf_flags) * ls.wi.abs_dot_norm(&si.shading.n),
                    bsdf.pdf(&si.it.wo, &ls.wi, bsdf_flags)),
                None => (Spectrum::new(0.0), 0.0)
            },
            Interactions::Medium(mi) => {
                let p = mi.phase.p(&mi.it.wo, &ls.wi);
                (Spectrum::new(p), p)
            }
        };

        if !f.is_black() {
            // Compute effect of visibility for light source sample
            let li = if handle_media {
                ls.li * ls.vis.tr(scene, sampler)
            } else if ls.vis.unoccluded(scene) {
                ls.li
            } else {
                Spectrum::new(0.0)
            };

            if !li.is_black() {
                ld += if is_delta_light(light.flags()) {
                    f * li / ls.pdf
                } else {
                    f * li * power_heuristic(1, ls.pdf, 1, scattering_pdf) / ls.pdf
                };
            }
        }
    }

    // Sample BSDF with multiple importance sampling
    if !is_delta_light(light.flags()) {
        let (f, wi, scattering_pdf, sampled_specular) = match it {
            Interactions::Surface(si) => match si.bsdf {
                Some(ref bsdf) => {
                    let s = bsdf.sample_f(&si.it.wo, uscatt, bsdf_flags);
                    (s.f * s.wi.abs_dot_norm(&si.shading.n), s.wi, s.pdf, is_specular(s.sampled_type))
                },
                None => return ld
            },
            Interactions::Medium(mi) => {
                let (p, wi) = mi.phase.sample_p(&mi.it.wo, uscatt);
                (Spectrum::new(p), wi, p, false)
            }
        };

        if !f.is_black() && scattering_pdf > 0.0 {
            let weight = if sampled_specular {
                1.0
            } else {
                let light_pdf = light.pdf_li(it.data(), &wi);
                if light_pdf == 0.0 { return ld; }

                power_heuristic(1, scattering_pdf, 1, light_pdf)
            };

            // Find intersection and compute transmittance
            let ray = it.spawn_ray(&wi);
            let (hit, tr) = if handle_media {
                scene.intersect_tr(ray, sampler)
            } else {
                let mut r = ray;
                (scene.intersect(&mut r), Spectrum::new(1.0))
            };

            // Add light contribution from material sampling
            let li = match hit {
                Some(ref isect) => {
                    let hit_light = isect.primitive
                        .and_then(|idx| scene.aggregate.primitive(idx).area_light());
                    if hit_light == Some(light_num) { isect.le(&-wi, scene) } else { Spectrum::new(0.0) }
                },
                None => light.le(&ray)
            };

            if !li.is_black() { ld += f * li * tr * weight / scattering_pdf; }
        }
    }

    ld
}

/// Seed of the per-thread samplers for one iteration.
pub fn iteration_seed(seed: u64, iteration: usize) -> u64 {
    mix_bits(seed ^ mix_bits(iteration as u64 + 1))
}

/// Cloneable stop flag checked by the driver loop between iterations.
#[derive(Debug, Clone, Default)]
pub struct RenderControl {
    stop: Arc<AtomicBool>
}

impl RenderControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the render to finish the iteration in flight and return.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Progress bar for one pass, registered so log lines print above it.
pub fn pass_progress_bar(len: usize, message: &str) -> Arc<ProgressBar> {
    let pb = Arc::new(ProgressBar::new(len as u64));
    pb.set_style(ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{wide_bar}] {percent}% [{pos}/{len}] ({eta})"));
    pb.set_message(message);
    set_progress_bar(Some(Arc::downgrade(&pb)));

    pb
}

pub fn finish_progress_bar(pb: &ProgressBar) {
    pb.finish_and_clear();
    set_progress_bar(None);
}

/// Writes the snapshot of `iteration` (when enabled) and the running mean of
/// the iterations done so far to the output file.
pub fn write_iteration(film: &Film, params: &RenderParams, iteration: usize) -> Result<()> {
    let scale = 1.0 / (iteration + 1) as Float;

    if params.save_every_iteration {
        let path = film.write_image(scale, Some(iteration + 1))?;
        info!("Wrote snapshot \"{}\"", path.display());
    }

    film.write_image(scale, None)?;

    Ok(())
}

#[enum_dispatch]
pub trait Integrator {
    /// Runs the iterations and returns how many completed.
    fn render(&mut self, scene: &Scene, scheduler: &ParallelScheduler, control: &RenderControl) -> Result<usize>;
}

#[enum_dispatch(Integrator)]
pub enum Integrators {
    PPMProbIntegrator,
    VCMIntegrator,
    PhotonMapIntegrator
}

pub fn create_integrator(name: &str, camera: Arc<Cameras>, params: &RenderParams) -> Result<Integrators> {
    params.validate()?;

    let integrator: Integrators = match name {
        "ppm" | "ppmprob"   => PPMProbIntegrator::new(camera, params.clone()).into(),
        "vcm" | "vcmups"    => VCMIntegrator::new(camera, params.clone()).into(),
        "photonmap"         => PhotonMapIntegrator::new(camera, params.clone()).into(),
        _ => bail!("Integrator \"{}\" unknown", name)
    };
    info!("Created \"{}\" integrator with {}", name, params);

    Ok(integrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        assert_eq!("power".parse::<LightSampleStrategy>().unwrap(), LightSampleStrategy::Power);
        assert_eq!("uniform".parse::<LightSampleStrategy>().unwrap(), LightSampleStrategy::Uniform);

        let err = "spatial".parse::<LightSampleStrategy>().unwrap_err();
        assert!(format!("{}", err).contains("spatial"));
    }

    #[test]
    fn stop_is_shared_between_clones() {
        let control = RenderControl::new();
        let other = control.clone();
        assert!(!control.stop_requested());

        other.request_stop();
        assert!(control.stop_requested());
    }

    #[test]
    fn iteration_seeds_differ() {
        assert_ne!(iteration_seed(0, 0), iteration_seed(0, 1));
        assert_ne!(iteration_seed(1, 0), iteration_seed(2, 0));
        assert_eq!(iteration_seed(5, 3), iteration_seed(5, 3));
    }
}

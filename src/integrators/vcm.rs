use std::sync::Arc;
use anyhow::Result;
use bumpalo_herd::Herd;
use log::{debug, info};
use crate::core::camera::{Camera, Cameras};
use crate::core::geometry::point::{Point2f, Point2i};
use crate::core::integrator::{
    Integrator, RenderControl, count_camera_ray, create_light_sample_distribution,
    finish_progress_bar, iteration_seed, pass_progress_bar, write_iteration};
use crate::core::light::Light;
use crate::core::material::TransportMode;
use crate::core::params::RenderParams;
use crate::core::parallel::{ParallelScheduler, PerThread, Schedule};
use crate::core::pbrt::Float;
use crate::core::sampler::{Sampler, Samplers};
use crate::core::sampling::concentric_sample_disk;
use crate::core::scene::Scene;
use crate::core::spectrum::Spectrum;
use crate::samplers::random::RandomSampler;
use crate::stat_percent;
use super::mis::calc_weight_sum;
use super::photonmap::{Photon, PhotonMap};
use super::radius::RadiusController;
use super::vertex::{
    Path, PathContext, Vertex, VertexType, WalkParams,
    generate_camera_subpath, generate_light_subpath, geometry_term};

stat_percent!("Integrator/Zero-radiance connections", zero_radiance_connections);

pub fn init_stats() {
    zero_radiance_connections::init();
}

/// Cone kernel constant used to randomize the connection weight.
const KERNEL_K: Float = 1.1;

/// Photon maps and lookup settings for the merging term.
pub struct MergeContext<'m> {
    /// One map per light subpath vertex index. Index 0 is unused.
    pub photon_maps : &'m [PhotonMap],
    pub lookup_size : usize,
    pub radius      : Float,
    /// Number of light subpaths merged against, one per pixel.
    pub npaths      : usize
}

/// Result of one (camera, light) vertex count pair.
#[derive(Debug, Default, Copy, Clone)]
pub struct Contribution {
    pub l       : Spectrum,
    /// Raster position to splat to, for connections to the lens.
    pub p_raster: Option<Point2f>,
    /// Whether the merging term found any photon.
    pub merged  : bool
}

/// Blends the connection term `l_mc` and the merging term `l_de`.
///
/// `sum_w` is the density ratio sum of the connection; zero means the path
/// contributes nothing. `kernel_w` is a random cone kernel weight.
pub fn kernel_blend(l_mc: Spectrum, l_de: Spectrum, sum_w: Float, kernel_w: Float, npaths: usize) -> Spectrum {
    if sum_w == 0.0 { return Spectrum::new(0.0); }

    let n = npaths as Float;
    let (mis_mc, mis_de) = match (l_mc.is_black(), l_de.is_black()) {
        (false, false) => {
            let denom = sum_w * kernel_w + sum_w * n;
            (kernel_w / denom, n / denom)
        },
        (false, true)  => (1.0 / sum_w, 0.0),
        (true, false)  => (0.0, 1.0 / sum_w),
        (true, true)   => (0.0, 0.0)
    };

    l_mc * mis_mc + l_de * (mis_de / n)
}

/// Random cone kernel weight from a disk sample.
pub fn kernel_weight(u: &Point2f) -> Float {
    let d = concentric_sample_disk(u);

    (1.0 - KERNEL_K * d.x.hypot(d.y)).max(0.0)
}

fn merge_term(vc: &Vertex, light_path: &[Vertex], lid: usize, merge: &MergeContext) -> Spectrum {
    if lid >= light_path.len() || !light_path[lid].is_connectible() {
        return Spectrum::new(0.0);
    }

    match (vc.surface(), merge.photon_maps.get(lid)) {
        (Some(si), Some(map)) => vc.beta * map.evaluate(si, merge.lookup_size, merge.radius),
        _                     => Spectrum::new(0.0)
    }
}

/// Contribution of the path made of the first `lid` light vertices and the
/// first `cid` camera vertices, weighted against every other strategy of the
/// same length including merging.
pub fn connect_vcm<'a>(
    ctx: &PathContext, light_path: &mut [Vertex<'a>], camera_path: &mut [Vertex<'a>],
    lid: usize, cid: usize, merge: &MergeContext, sampler: &mut Samplers) -> Contribution {
    let scene = ctx.scene;
    let mut c = Contribution::default();

    // Ignore invalid connections related to infinite area lights
    if cid > 1 && lid != 0 && camera_path[cid - 1].vtype == VertexType::Light {
        return c;
    }

    let mut l_mc = Spectrum::new(0.0);
    let mut l_de = Spectrum::new(0.0);
    let mut sampled = None;

    if lid == 0 {
        // Interpret the camera subpath as a complete path
        let vc = camera_path[cid - 1];
        if vc.is_light(scene) { l_mc = vc.le(scene, &camera_path[cid - 2]) * vc.beta; }
    } else if cid == 1 {
        // Sample a point on the camera and connect it to the light subpath
        let vl = light_path[lid - 1];
        if vl.is_connectible() {
            let cs = ctx.camera.sample_wi(vl.data(), &sampler.get_2d());
            if cs.pdf > 0.0 && !cs.we.is_black() {
                let s = Vertex::create_camera(cs.vis.p1(), cs.we / cs.pdf);
                l_mc = vl.beta * vl.f(&s, TransportMode::Importance) * s.beta;
                if vl.is_on_surface() { l_mc *= cs.wi.abs_dot_norm(&vl.ns()); }
                if !l_mc.is_black() { l_mc *= cs.vis.tr(scene, sampler); }
                c.p_raster = Some(cs.p_raster);
                sampled = Some(s);
            }
        }
    } else if lid == 1 {
        // Sample a point on a light and connect it to the camera subpath
        let vc = camera_path[cid - 1];
        if vc.is_connectible() {
            let (light_num, light_pdf) = ctx.light_distr.sample_discrete(sampler.get_1d());
            let light = &scene.lights[light_num];
            let ls = light.sample_li(vc.data(), &sampler.get_2d());

            if light_pdf > 0.0 && ls.pdf > 0.0 && !ls.li.is_black() {
                let mut s = Vertex::create_light(scene, light_num, ls.vis.p1(), ls.li / (ls.pdf * light_pdf), 0.0);
                s.pdf_fwd = s.pdf_light_origin(ctx, &vc);
                l_mc = vc.beta * vc.f(&s, TransportMode::Radiance) * s.beta;
                if vc.is_on_surface() { l_mc *= ls.wi.abs_dot_norm(&vc.ns()); }
                if !l_mc.is_black() { l_mc *= ls.vis.tr(scene, sampler); }
                sampled = Some(s);
            }

            l_de = merge_term(&vc, light_path, lid, merge);
        }
    } else {
        // Handle all other bidirectional connection cases
        let vc = camera_path[cid - 1];
        let vl = light_path[lid - 1];
        if vc.is_connectible() && vl.is_connectible() {
            l_mc = vc.beta * vc.f(&vl, TransportMode::Radiance) * vl.f(&vc, TransportMode::Importance) * vl.beta;
            if !l_mc.is_black() { l_mc *= geometry_term(scene, sampler, &vl, &vc); }

            l_de = merge_term(&vc, light_path, lid, merge);
        }
    }

    let sum_w = if l_mc.is_black() {
        0.0
    } else {
        calc_weight_sum(ctx, light_path, camera_path, sampled, lid, cid)
    };
    if sum_w == 0.0 { return c; }

    let kernel_w = kernel_weight(&sampler.get_2d());
    c.l = kernel_blend(l_mc, l_de, sum_w, kernel_w, merge.npaths);
    c.merged = !l_de.is_black();

    c
}

/// Subpaths sampled for one pixel in one iteration.
struct PixelPaths<'a> {
    camera  : Path<'a>,
    light   : Path<'a>
}

/// Vertex connection and merging.
///
/// Every iteration samples one camera and one light subpath per pixel, turns
/// the light subpath vertices into one photon map per bounce and combines
/// each connection with the density estimate at its camera vertex.
pub struct VCMIntegrator {
    camera  : Arc<Cameras>,
    params  : RenderParams,
    radius  : RadiusController
}

impl VCMIntegrator {
    pub fn new(camera: Arc<Cameras>, params: RenderParams) -> Self {
        let radius = RadiusController::new(params.radius_mode, params.lookup_radius_ratio);

        Self { camera, params, radius }
    }

    pub fn radius(&self) -> &RadiusController {
        &self.radius
    }
}

fn build_photon_maps(paths: &[PixelPaths], max_depth: usize) -> Vec<PhotonMap> {
    let mut maps = Vec::with_capacity(max_depth + 1);
    maps.push(PhotonMap::default());

    for b in 1..=max_depth {
        let photons: Vec<Photon> = paths
            .iter()
            .filter_map(|pp| pp.light.get(b))
            .filter_map(|v| v.surface().map(|si| Photon::new(v.p(), v.beta, si.it.wo, si.it.n)))
            .collect();
        info!("Bounce {}: {} photons", b, photons.len());
        maps.push(PhotonMap::new(photons));
    }

    maps
}

impl Integrator for VCMIntegrator {
    fn render(&mut self, scene: &Scene, scheduler: &ParallelScheduler, control: &RenderControl) -> Result<usize> {
        let params = self.params.clone();
        let film = self.camera.film();
        let res = film.full_resolution;
        let npixels = film.num_pixels();
        let camera: &Cameras = &self.camera;

        // Compute light distribution and starting radius
        let light_distr = create_light_sample_distribution(params.light_sample_strategy, scene)?;
        let r0 = RadiusController::initial_radius(&params, &scene.world_bound());
        self.radius.initialize(r0, npixels);
        info!("Vertex connection and merging: {} pixels, initial radius {}", npixels, r0);

        let ctx = PathContext { scene, camera, light_distr: &light_distr };
        let camera_walk = WalkParams { max_vertices: params.max_depth + 2, rr_depth: params.rr_depth };
        let light_walk = WalkParams { max_vertices: params.max_depth + 1, rr_depth: params.rr_depth };

        let prototype: Samplers = RandomSampler::new(params.seed).into();
        let mut samplers = PerThread::new(scheduler, |_| prototype.clone_with_seed(params.seed));
        let mut herd = Herd::new();
        let mut completed = 0;

        for i in 0..params.sample_count {
            if control.stop_requested() {
                info!("Stop requested, finishing after {} iterations", completed);
                break;
            }

            let seed = iteration_seed(params.seed, i);
            for s in samplers.iter_mut() { *s = prototype.clone_with_seed(seed); }

            {
                let arena = &herd;
                let pb = pass_progress_bar(2 * npixels, &format!("Iteration {}/{}", i + 1, params.sample_count));

                // Sample camera and light subpaths
                let mut paths: Vec<PixelPaths> = scheduler.parallel_map(0, npixels, Schedule::Dynamic, |pid| {
                    let member = arena.get();
                    let mut sampler = samplers.get(scheduler);
                    sampler.start_pixel(pid as u64);

                    let pixel = Point2i::new((pid % res.x as usize) as i32, (pid / res.x as usize) as i32);
                    let u = sampler.get_2d();
                    let p_film = Point2f::new(pixel.x as Float + u.x, pixel.y as Float + u.y);
                    count_camera_ray();

                    let mut cpath = Path::with_capacity(camera_walk.max_vertices);
                    let mut lpath = Path::with_capacity(light_walk.max_vertices);
                    generate_camera_subpath(&ctx, &mut sampler, &member, camera_walk, &p_film, &mut cpath);
                    let time = cpath.first().map_or(0.0, |v| v.time());
                    generate_light_subpath(&ctx, &mut sampler, &member, light_walk, time, &mut lpath);
                    pb.inc(1);

                    PixelPaths { camera: cpath, light: lpath }
                });

                // Photon maps for each bounce count
                let photon_maps = build_photon_maps(&paths, params.max_depth);
                let radius = self.radius.snapshot();
                info!(
                    "Iteration {}/{}: radius {}, {} photons stored",
                    i + 1, params.sample_count, self.radius.max_radius(),
                    photon_maps.iter().map(|m| m.len()).sum::<usize>());

                // Connect and merge
                scheduler.parallel_for_mut(&mut paths, Schedule::Dynamic, |pid, pp| {
                    let mut sampler = samplers.get(scheduler);
                    sampler.start_pixel((npixels + pid) as u64);

                    let pixel = Point2i::new((pid % res.x as usize) as i32, (pid / res.x as usize) as i32);
                    let merge = MergeContext {
                        photon_maps: &photon_maps,
                        lookup_size: params.lookup_size,
                        radius: radius.radius(pid),
                        npaths: npixels
                    };
                    let (ncamera, nlight) = (pp.camera.len(), pp.light.len());
                    let mut l = Spectrum::new(0.0);

                    for cid in 1..=ncamera {
                        for lid in 0..=nlight {
                            let depth = cid as isize + lid as isize - 2;
                            if (cid == 1 && lid == 1) || depth < 0 || depth > params.max_depth as isize {
                                continue;
                            }

                            let c = connect_vcm(&ctx, &mut pp.light, &mut pp.camera, lid, cid, &merge, &mut sampler);
                            zero_radiance_connections::inc_den();
                            if c.l.is_black() { zero_radiance_connections::inc_num(); }
                            if c.merged { radius.record_hit(pid); }

                            match c.p_raster {
                                Some(p) if cid == 1 => {
                                    if !c.l.is_black() { film.add_splat(&p, c.l); }
                                },
                                _ => l += c.l
                            }
                        }
                    }

                    debug!("Pixel {} L = {}", pixel, l);
                    film.add_sample(&pixel, l);
                    pb.inc(1);
                });
                finish_progress_bar(&pb);
            }

            // Release this iteration's subpaths
            herd.reset();
            write_iteration(&film, &params, i)?;
            self.radius.decay();
            completed += 1;
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn blend_of_two_black_terms_is_black() {
        let l = kernel_blend(Spectrum::new(0.0), Spectrum::new(0.0), 2.0, 0.5, 64);

        assert!(l.is_black());
    }

    #[test]
    fn zero_weight_sum_contributes_nothing() {
        let l = kernel_blend(Spectrum::new(1.0), Spectrum::new(1.0), 0.0, 0.5, 64);

        assert!(l.is_black());
    }

    #[test]
    fn connection_only_uses_balance_weight() {
        let l = kernel_blend(Spectrum::new(3.0), Spectrum::new(0.0), 3.0, 0.2, 16);

        assert!(relative_eq!(l.y(), Spectrum::new(1.0).y(), max_relative = 1e-5));
    }

    #[test]
    fn kernel_weight_is_one_at_center_and_zero_at_rim() {
        assert_eq!(kernel_weight(&Point2f::new(0.5, 0.5)), 1.0);
        assert_eq!(kernel_weight(&Point2f::new(1.0, 0.5)), 0.0);
    }
}

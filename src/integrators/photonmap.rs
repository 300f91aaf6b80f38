use std::cmp::Ordering::Equal;
use std::collections::BinaryHeap;
use log::{debug, info};
use ordered_float::OrderedFloat;
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::point::Point3f;
use crate::core::geometry::vector::Vector3f;
use crate::core::interaction::{Interaction, SurfaceInteraction};
use crate::core::light::Light;
use crate::core::material::TransportMode;
use crate::core::medium::{Medium, PhaseFunction};
use crate::core::parallel::{ParallelScheduler, PerThread, Schedule};
use crate::core::pbrt::{Float, PI, mix_bits};
use crate::core::reflection::{BxDFType, is_specular};
use crate::core::sampler::{Sampler, Samplers};
use crate::core::sampling::Distribution1D;
use crate::core::scene::Scene;
use crate::core::spectrum::Spectrum;
use crate::{stat_counter, stat_int_distribution};

stat_counter!("Photon map/Photon paths traced", nphoton_paths);
stat_counter!("Photon map/Photons stored", nphotons_stored);
stat_counter!("Photon map/k-NN lookups", nlookups);
stat_int_distribution!("Photon map/Photons per lookup", photons_per_lookup);

pub fn init_stats() {
    nphoton_paths::init();
    nphotons_stored::init();
    nlookups::init();
    photons_per_lookup::init();
}

/// Cone filter constant of the density estimator.
const CONE_K: Float = 1.1;

/// Energy packet left on a surface.
#[derive(Debug, Default, Copy, Clone)]
pub struct Photon {
    pub p   : Point3f,
    pub flux: Spectrum,
    /// Direction back toward where the photon came from.
    pub wi  : Vector3f,
    pub n   : Normal3f
}

impl Photon {
    pub fn new(p: Point3f, flux: Spectrum, wi: Vector3f, n: Normal3f) -> Self {
        Self { p, flux, wi, n }
    }
}

/// A photon returned by a lookup with its distance to the query point.
#[derive(Debug, Copy, Clone)]
pub struct NearPhoton<'a> {
    pub photon  : &'a Photon,
    pub distance: Float
}

/// Radiance estimate and the number of photons it used.
#[derive(Debug, Default, Copy, Clone)]
pub struct RadianceEstimate {
    pub l           : Spectrum,
    pub nphotons    : usize
}

/// Balanced kd-tree over photon positions.
///
/// The tree is implicit: the photon splitting the index range `[lo, hi)` sits
/// at `lo + (hi - lo) / 2`, with its split axis in `axes` at the same index.
/// A map is immutable once built and may be queried from any thread.
#[derive(Debug, Default)]
pub struct PhotonMap {
    photons : Vec<Photon>,
    axes    : Vec<u8>
}

impl PhotonMap {
    pub fn new(mut photons: Vec<Photon>) -> Self {
        let mut axes = vec![0u8; photons.len()];
        build(&mut photons, &mut axes);
        debug!("Built photon map over {} photons", photons.len());

        Self { photons, axes }
    }

    /// Replaces the stored photons.
    pub fn construct(&mut self, photons: Vec<Photon>) {
        *self = PhotonMap::new(photons);
    }

    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    /// At most `max_count` photons no farther than `max_radius` from `p`,
    /// nearest first.
    pub fn lookup(&self, p: &Point3f, max_count: usize, max_radius: Float) -> Vec<NearPhoton<'_>> {
        nlookups::inc();
        if max_count == 0 || self.photons.is_empty() { return Vec::new(); }

        let mut heap: BinaryHeap<(OrderedFloat<Float>, usize)> = BinaryHeap::with_capacity(max_count + 1);
        let mut max_dist2 = max_radius * max_radius;
        self.knn(0, self.photons.len(), p, max_count, &mut max_dist2, &mut heap);

        let near: Vec<NearPhoton> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|(d2, i)| NearPhoton { photon: &self.photons[i], distance: d2.into_inner().sqrt() })
            .collect();
        photons_per_lookup::report_value(near.len() as u64);

        near
    }

    /// Every photon within `radius` of `p`, in no particular order.
    pub fn gather(&self, p: &Point3f, radius: Float) -> Vec<NearPhoton<'_>> {
        let mut found = Vec::new();
        self.range(0, self.photons.len(), p, radius * radius, &mut found);

        found
    }

    fn knn(
        &self, lo: usize, hi: usize, p: &Point3f, k: usize, max_dist2: &mut Float,
        heap: &mut BinaryHeap<(OrderedFloat<Float>, usize)>) {
        if lo >= hi { return; }

        let mid = lo + (hi - lo) / 2;
        let photon = &self.photons[mid];
        let axis = self.axes[mid] as usize;
        let delta = p[axis] - photon.p[axis];
        let (near, far) = if delta < 0.0 { ((lo, mid), (mid + 1, hi)) } else { ((mid + 1, hi), (lo, mid)) };

        self.knn(near.0, near.1, p, k, max_dist2, heap);

        let d2 = p.distance_squared(&photon.p);
        if d2 <= *max_dist2 {
            heap.push((OrderedFloat(d2), mid));
            if heap.len() > k { heap.pop(); }
            // Once full, only photons closer than the current k-th may enter
            if heap.len() == k {
                if let Some((worst, _)) = heap.peek() { *max_dist2 = worst.into_inner(); }
            }
        }

        if delta * delta <= *max_dist2 {
            self.knn(far.0, far.1, p, k, max_dist2, heap);
        }
    }

    fn range<'a>(&'a self, lo: usize, hi: usize, p: &Point3f, r2: Float, found: &mut Vec<NearPhoton<'a>>) {
        if lo >= hi { return; }

        let mid = lo + (hi - lo) / 2;
        let photon = &self.photons[mid];
        let axis = self.axes[mid] as usize;
        let delta = p[axis] - photon.p[axis];

        let d2 = p.distance_squared(&photon.p);
        if d2 <= r2 { found.push(NearPhoton { photon, distance: d2.sqrt() }); }

        if delta < 0.0 || delta * delta <= r2 { self.range(lo, mid, p, r2, found); }
        if delta >= 0.0 || delta * delta <= r2 { self.range(mid + 1, hi, p, r2, found); }
    }

    /// Density estimate of the radiance leaving `si` toward `si.wo` from the
    /// nearest `max_count` photons within `max_radius`, with a cone filter.
    pub fn estimate(&self, si: &SurfaceInteraction, max_count: usize, max_radius: Float) -> RadianceEstimate {
        let bsdf = match si.bsdf {
            Some(ref b) => b,
            None        => return RadianceEstimate::default()
        };

        // Photons that arrived on the other side of a thin surface
        let side = si.it.wo.dot_norm(&si.it.n);
        let near: Vec<NearPhoton> = self
            .lookup(&si.it.p, max_count, max_radius)
            .into_iter()
            .filter(|n| n.photon.wi.dot_norm(&si.it.n) * side > 0.0)
            .collect();
        let max_dist = match near.last() {
            Some(n) if n.distance > 0.0 => n.distance,
            _                           => return RadianceEstimate::default()
        };

        let mut l = near.iter().fold(Spectrum::new(0.0), |acc, n| {
            let w = (1.0 - n.distance / (CONE_K * max_dist)).max(0.0);
            let f = bsdf.f(&si.it.wo, &n.photon.wi, BxDFType::All as u8);

            acc + f * n.photon.flux * w
        });
        l /= (1.0 - 2.0 / (3.0 * CONE_K)) * PI * max_dist * max_dist;

        RadianceEstimate { l, nphotons: near.len() }
    }

    pub fn evaluate(&self, si: &SurfaceInteraction, max_count: usize, max_radius: Float) -> Spectrum {
        self.estimate(si, max_count, max_radius).l
    }
}

fn build(photons: &mut [Photon], axes: &mut [u8]) {
    if photons.len() <= 1 { return; }

    let bounds = photons.iter().fold(Bounds3f::default(), |b, ph| b.union_point(&ph.p));
    let axis = bounds.maximum_extent();
    let mid = photons.len() / 2;
    photons.select_nth_unstable_by(mid, |a, b| a.p[axis].partial_cmp(&b.p[axis]).unwrap_or(Equal));
    axes[mid] = axis as u8;

    let (left, right) = photons.split_at_mut(mid);
    let (left_axes, right_axes) = axes.split_at_mut(mid);
    build(left, left_axes);
    build(&mut right[1..], &mut right_axes[1..]);
}

/// Sampler seed of the photon pass of an iteration, kept apart from the
/// camera pass seed.
pub fn photon_seed(iteration_seed: u64) -> u64 {
    mix_bits(iteration_seed.wrapping_add(1))
}

/// Light-tracing settings shared by the photon mapping integrators.
#[derive(Copy, Clone)]
pub struct PhotonTracer<'a> {
    pub scene       : &'a Scene,
    pub light_distr : &'a Distribution1D,
    pub max_depth   : usize,
    pub rr_depth    : usize
}

impl<'a> PhotonTracer<'a> {
    /// Traces `nphotons` photon paths in parallel. Photon flux is divided by
    /// `nphotons`. The result is ordered by photon index.
    pub fn trace(
        &self, scheduler: &ParallelScheduler, samplers: &PerThread<Samplers>, nphotons: usize) -> Vec<Photon> {
        let lists = scheduler.parallel_map(0, nphotons, Schedule::Static, |index| {
            let mut sampler = samplers.get(scheduler);
            sampler.start_pixel(index as u64);

            self.trace_one(&mut sampler, nphotons)
        });

        let photons: Vec<Photon> = lists.into_iter().flatten().collect();
        nphoton_paths::add(nphotons as u64);
        nphotons_stored::add(photons.len() as u64);
        info!("Traced {} photon paths, stored {} photons", nphotons, photons.len());

        photons
    }

    /// One photon path. A photon is left at every surface with a
    /// non-specular component.
    pub fn trace_one(&self, sampler: &mut Samplers, nphotons: usize) -> Vec<Photon> {
        let scene = self.scene;
        let mut photons = Vec::new();

        // Choose light to shoot photon from
        let (light_num, light_pdf) = self.light_distr.sample_discrete(sampler.get_1d());
        if light_pdf == 0.0 { return photons; }
        let light = &scene.lights[light_num];

        // Generate photon ray from light source and initialize beta
        let u1 = sampler.get_2d();
        let u2 = sampler.get_2d();
        let les = light.sample_le(&u1, &u2, 0.0);
        if les.pdf_pos == 0.0 || les.pdf_dir == 0.0 || les.le.is_black() { return photons; }

        let mut beta = les.le * les.n_light.abs_dot_vec(&les.ray.d) /
            (light_pdf * les.pdf_pos * les.pdf_dir * nphotons as Float);
        if beta.is_black() { return photons; }

        let mut ray = les.ray;
        let non_specular = BxDFType::All as u8 & !(BxDFType::Specular as u8);
        let mut depth = 0;

        while depth < self.max_depth {
            let hit = scene.intersect(&mut ray);

            // Sample participating media along the photon ray
            if let Some(m) = ray.medium {
                let (tr, mi) = scene.medium(m).sample(&ray, sampler);
                beta *= tr;
                if beta.is_black() { break; }

                if let Some(mi) = mi {
                    let (p, wi) = mi.phase.sample_p(&mi.it.wo, &sampler.get_2d());
                    if p == 0.0 { break; }
                    ray = mi.spawn_ray(&wi);
                    depth += 1;
                    continue;
                }
            }

            let mut isect = match hit {
                Some(isect) => isect,
                None        => break
            };

            isect.compute_scattering_functions(scene, TransportMode::Importance);
            let bsdf = match isect.bsdf {
                Some(ref b) => b,
                None        => {
                    ray = isect.spawn_ray(&ray.d);
                    continue;
                }
            };

            if bsdf.num_components(non_specular) > 0 {
                photons.push(Photon::new(isect.it.p, beta, isect.it.wo, isect.it.n));
            }

            // Sample new photon ray direction
            let s = bsdf.sample_f(&isect.it.wo, &sampler.get_2d(), BxDFType::All as u8);
            if s.f.is_black() || s.pdf == 0.0 { break; }
            let bnew = beta * s.f * s.wi.abs_dot_norm(&isect.shading.n) / s.pdf;

            // Possibly terminate photon path with Russian roulette
            if depth >= self.rr_depth && !is_specular(s.sampled_type) {
                let q = (1.0 - bnew.y() / beta.y()).max(0.0);
                if sampler.get_1d() < q { break; }
                beta = bnew / (1.0 - q);
            } else {
                beta = bnew;
            }

            ray = isect.spawn_ray(&s.wi);
            depth += 1;
        }

        photons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use crate::core::rng::RNG;

    fn random_photons(n: usize) -> Vec<Photon> {
        let mut rng = RNG::new(7);

        (0..n)
            .map(|_| {
                let p = Point3f::new(rng.uniform_float(), rng.uniform_float(), rng.uniform_float());
                Photon::new(p, Spectrum::new(1.0), Vector3f::new(0.0, 0.0, 1.0), Normal3f::new(0.0, 0.0, 1.0))
            })
            .collect()
    }

    #[test]
    fn knn_is_nearest_first_and_bounded() {
        let photons = random_photons(500);
        let q = Point3f::new(0.5, 0.5, 0.5);
        let map = PhotonMap::new(photons.clone());

        let near = map.lookup(&q, 10, 0.3);
        assert!(near.len() <= 10);
        assert!(near.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(near.iter().all(|n| n.distance <= 0.3));

        // Same result as a brute force scan
        let mut d: Vec<Float> = photons.iter().map(|ph| ph.p.distance(&q)).filter(|d| *d <= 0.3).collect();
        d.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (n, e) in near.iter().zip(d.iter()) {
            assert!(relative_eq!(n.distance, *e, max_relative = 1e-5));
        }
    }

    #[test]
    fn gather_matches_brute_force() {
        let photons = random_photons(300);
        let map = PhotonMap::new(photons.clone());
        let q = Point3f::new(0.2, 0.7, 0.4);

        let expected = photons.iter().filter(|ph| ph.p.distance_squared(&q) <= 0.04).count();
        assert_eq!(map.gather(&q, 0.2).len(), expected);
    }

    #[test]
    fn empty_map_finds_nothing() {
        let map = PhotonMap::default();

        assert!(map.is_empty());
        assert!(map.lookup(&Point3f::default(), 8, 1.0).is_empty());
        assert!(map.gather(&Point3f::default(), 1.0).is_empty());
    }
}

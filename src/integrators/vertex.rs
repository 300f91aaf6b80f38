use std::fmt::{Display, Formatter, Result};
use std::ops::{Deref, DerefMut};
use bumpalo_herd::Member;
use log::debug;
use static_assertions::assert_impl_all;
use crate::core::camera::{Camera, CameraSample, Cameras};
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::point::{Point2f, Point3f};
use crate::core::geometry::ray::Ray;
use crate::core::geometry::vector::Vector3f;
use crate::core::interaction::{Interaction, InteractionData, MediumInteraction, SurfaceInteraction};
use crate::core::light::{Light, LightFlags, VisibilityTester, is_delta_light};
use crate::core::material::TransportMode;
use crate::core::medium::{Medium, MediumInterface, PhaseFunction};
use crate::core::pbrt::{Float, INFINITY, PI};
use crate::core::primitive::Primitive;
use crate::core::reflection::BxDFType;
use crate::core::sampler::{Sampler, Samplers};
use crate::core::sampling::Distribution1D;
use crate::core::scene::Scene;
use crate::core::spectrum::Spectrum;
use crate::stat_int_distribution;

stat_int_distribution!("Integrator/Camera subpath length", camera_path_length);
stat_int_distribution!("Integrator/Light subpath length", light_path_length);

pub fn init_stats() {
    camera_path_length::init();
    light_path_length::init();
}

/// Scene data a vertex needs to evaluate densities.
#[derive(Copy, Clone)]
pub struct PathContext<'a> {
    pub scene       : &'a Scene,
    pub camera      : &'a Cameras,
    pub light_distr : &'a Distribution1D
}

fn correct_shading_normal(isect: &SurfaceInteraction, wo: &Vector3f, wi: &Vector3f, mode: TransportMode) -> Float {
    match mode {
        TransportMode::Importance => {
            let num = wo.abs_dot_norm(&isect.shading.n) * wi.abs_dot_norm(&isect.it.n);
            let denom = wo.abs_dot_norm(&isect.it.n) * wi.abs_dot_norm(&isect.shading.n);
            // wi is occasionally perpendicular to the shading normal
            if denom == 0.0 { return 0.0; }

            num / denom
        },
        TransportMode::Radiance => 1.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointKind {
    Camera,
    /// Index into the scene's lights, with the light's flags.
    Light { index: usize, flags: u8 },
    /// End of a camera ray that left the scene, lit by the infinite lights.
    Escaped
}

#[derive(Debug, Copy, Clone)]
pub enum VertexInteraction<'a> {
    Endpoint { it: InteractionData, kind: EndpointKind },
    Surface(&'a SurfaceInteraction),
    Medium(&'a MediumInteraction)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexType { Camera, Light, Surface, Medium }

/// One vertex of a camera or light subpath.
///
/// Surface and medium vertices borrow their interaction from the arena of
/// the iteration that created them. `pdf_fwd` and `pdf_rev` are area
/// densities (solid angle toward infinite lights).
#[derive(Debug, Copy, Clone)]
pub struct Vertex<'a> {
    pub vtype   : VertexType,
    pub beta    : Spectrum,
    pub delta   : bool,
    pub pdf_fwd : Float,
    pub pdf_rev : Float,
    pub intr    : VertexInteraction<'a>
}

assert_impl_all!(Vertex<'static>: Copy, Send, Sync);

impl<'a> Display for Vertex<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let t = match self.vtype {
            VertexType::Camera  => "camera",
            VertexType::Light   => "light",
            VertexType::Surface => "surface",
            VertexType::Medium  => "medium"
        };

        write!(
            f, "[ Vertex type: {} p: {} ng: {} pdfFwd: {} pdfRev: {} beta: {} delta: {} ]",
            t, self.p(), self.ng(), self.pdf_fwd, self.pdf_rev, self.beta, self.delta)
    }
}

impl<'a> Vertex<'a> {
    pub fn new(vtype: VertexType, intr: VertexInteraction<'a>, beta: Spectrum) -> Self {
        Self { vtype, beta, intr, delta: false, pdf_fwd: 0.0, pdf_rev: 0.0 }
    }

    pub fn create_camera_ray(ray: &Ray, beta: Spectrum) -> Self {
        let it = InteractionData::from_point(ray.o, ray.time, ray.medium);

        Self::new(VertexType::Camera, VertexInteraction::Endpoint { it, kind: EndpointKind::Camera }, beta)
    }

    /// Camera vertex at a sampled point on the lens.
    pub fn create_camera(it: &InteractionData, beta: Spectrum) -> Self {
        Self::new(VertexType::Camera, VertexInteraction::Endpoint { it: *it, kind: EndpointKind::Camera }, beta)
    }

    pub fn create_light_ray(
        scene: &Scene, light: usize, ray: &Ray, n_light: Normal3f, le: Spectrum, pdf: Float) -> Self {
        let it = InteractionData {
            p               : ray.o,
            time            : ray.time,
            n               : n_light,
            medium_interface: MediumInterface::new(ray.medium),
            ..Default::default()
        };
        let kind = EndpointKind::Light { index: light, flags: scene.lights[light].flags() };
        let mut v = Self::new(VertexType::Light, VertexInteraction::Endpoint { it, kind }, le);
        v.pdf_fwd = pdf;

        v
    }

    /// Light vertex at a sampled point on light `light`.
    pub fn create_light(scene: &Scene, light: usize, it: &InteractionData, beta: Spectrum, pdf: Float) -> Self {
        let kind = EndpointKind::Light { index: light, flags: scene.lights[light].flags() };
        let mut v = Self::new(VertexType::Light, VertexInteraction::Endpoint { it: *it, kind }, beta);
        v.pdf_fwd = pdf;

        v
    }

    /// Light vertex standing for the infinite lights seen by an escaped ray.
    pub fn create_escaped(ray: &Ray, beta: Spectrum, pdf: Float) -> Self {
        let it = InteractionData {
            p               : ray.find_point(1.0),
            time            : ray.time,
            n               : Normal3f::from(-ray.d),
            medium_interface: MediumInterface::new(ray.medium),
            ..Default::default()
        };
        let mut v = Self::new(VertexType::Light, VertexInteraction::Endpoint { it, kind: EndpointKind::Escaped }, beta);
        v.pdf_fwd = pdf;

        v
    }

    pub fn create_surface(si: &'a SurfaceInteraction, beta: Spectrum, pdf: Float, prev: &Self) -> Self {
        let mut v = Self::new(VertexType::Surface, VertexInteraction::Surface(si), beta);
        v.pdf_fwd = prev.convert_density(pdf, &v);

        v
    }

    pub fn create_medium(mi: &'a MediumInteraction, beta: Spectrum, pdf: Float, prev: &Self) -> Self {
        let mut v = Self::new(VertexType::Medium, VertexInteraction::Medium(mi), beta);
        v.pdf_fwd = prev.convert_density(pdf, &v);

        v
    }

    pub fn data(&self) -> &InteractionData {
        match self.intr {
            VertexInteraction::Endpoint { ref it, .. } => it,
            VertexInteraction::Surface(si)             => &si.it,
            VertexInteraction::Medium(mi)              => &mi.it
        }
    }

    pub fn surface(&self) -> Option<&'a SurfaceInteraction> {
        match self.intr {
            VertexInteraction::Surface(si) => Some(si),
            _                              => None
        }
    }

    pub fn p(&self) -> Point3f {
        self.data().p
    }

    pub fn time(&self) -> Float {
        self.data().time
    }

    pub fn ng(&self) -> Normal3f {
        self.data().n
    }

    pub fn ns(&self) -> Normal3f {
        match self.intr {
            VertexInteraction::Surface(si) => si.shading.n,
            _                              => self.ng()
        }
    }

    pub fn is_on_surface(&self) -> bool {
        !self.ng().is_zero()
    }

    /// Index of the light at this vertex: the sampled light of a light
    /// endpoint or the area light of an emitting surface.
    pub fn light_index(&self, scene: &Scene) -> Option<usize> {
        match self.intr {
            VertexInteraction::Endpoint { kind: EndpointKind::Light { index, .. }, .. } => Some(index),
            VertexInteraction::Surface(si) => si.primitive.and_then(|idx| scene.aggregate.primitive(idx).area_light()),
            _ => None
        }
    }

    pub fn is_connectible(&self) -> bool {
        match self.vtype {
            VertexType::Medium | VertexType::Camera => true,
            VertexType::Light  => match self.intr {
                VertexInteraction::Endpoint { kind: EndpointKind::Light { flags, .. }, .. } =>
                    (flags & LightFlags::DeltaDirection as u8) == 0,
                _ => false
            },
            VertexType::Surface => match self.intr {
                VertexInteraction::Surface(si) => si.bsdf.as_ref().map_or(false, |bsdf| {
                    let flags = BxDFType::Diffuse as u8 | BxDFType::Glossy as u8 |
                        BxDFType::Reflection as u8 | BxDFType::Transmission as u8;
                    bsdf.num_components(flags) > 0
                }),
                _ => false
            }
        }
    }

    pub fn is_light(&self, scene: &Scene) -> bool {
        match self.vtype {
            VertexType::Light   => true,
            VertexType::Surface => self.light_index(scene).is_some(),
            _                   => false
        }
    }

    pub fn is_delta_light(&self) -> bool {
        match self.intr {
            VertexInteraction::Endpoint { kind: EndpointKind::Light { flags, .. }, .. } =>
                self.vtype == VertexType::Light && is_delta_light(flags),
            _ => false
        }
    }

    pub fn is_infinite_light(&self) -> bool {
        if self.vtype != VertexType::Light { return false; }

        match self.intr {
            VertexInteraction::Endpoint { kind: EndpointKind::Escaped, .. } => true,
            VertexInteraction::Endpoint { kind: EndpointKind::Light { flags, .. }, .. } =>
                (flags & LightFlags::Infinite as u8) != 0 || (flags & LightFlags::DeltaDirection as u8) != 0,
            _ => false
        }
    }

    /// Scattering function value toward `next`. Zero at endpoints.
    pub fn f(&self, next: &Self, mode: TransportMode) -> Spectrum {
        let wi = next.p() - self.p();
        if wi.length_squared() == 0.0 { return Spectrum::new(0.0); }
        let wi = wi.normalize();

        match self.intr {
            VertexInteraction::Surface(si) => match si.bsdf {
                Some(ref bsdf) =>
                    bsdf.f(&si.it.wo, &wi, BxDFType::All as u8) * correct_shading_normal(si, &si.it.wo, &wi, mode),
                None => Spectrum::new(0.0)
            },
            VertexInteraction::Medium(mi) => Spectrum::new(mi.phase.p(&mi.it.wo, &wi)),
            _ => Spectrum::new(0.0)
        }
    }

    /// Turns a solid angle density at this vertex into an area density at
    /// `next`.
    pub fn convert_density(&self, pdf: Float, next: &Self) -> Float {
        // Solid angle density is kept toward infinite lights
        if next.is_infinite_light() { return pdf; }

        let w = next.p() - self.p();
        if w.length_squared() == 0.0 { return 0.0; }
        let inv_dist2 = 1.0 / w.length_squared();
        let mut pdf = pdf;
        if next.is_on_surface() {
            pdf *= next.ng().abs_dot_vec(&(w * inv_dist2.sqrt()));
        }

        pdf * inv_dist2
    }

    /// Area density of sampling `next` from this vertex, having arrived from
    /// `prev`.
    pub fn pdf(&self, ctx: &PathContext, prev: Option<&Self>, next: &Self) -> Float {
        if self.vtype == VertexType::Light { return self.pdf_light(ctx.scene, next); }

        // Compute directions to preceding and next vertex
        let wn = next.p() - self.p();
        if wn.length_squared() == 0.0 { return 0.0; }
        let wn = wn.normalize();
        let wp = match prev {
            Some(pv) => {
                let wp = pv.p() - self.p();
                if wp.length_squared() == 0.0 { return 0.0; }
                wp.normalize()
            },
            None => {
                debug_assert!(self.vtype == VertexType::Camera);
                Vector3f::default()
            }
        };

        // Compute directional density depending on the vertex type
        let pdf = match self.intr {
            VertexInteraction::Endpoint { ref it, kind: EndpointKind::Camera } =>
                ctx.camera.pdf_we(&it.spawn_ray(&wn)).1,
            VertexInteraction::Surface(si) =>
                si.bsdf.as_ref().map_or(0.0, |bsdf| bsdf.pdf(&wp, &wn, BxDFType::All as u8)),
            VertexInteraction::Medium(mi) => mi.phase.p(&wp, &wn),
            _ => 0.0
        };

        self.convert_density(pdf, next)
    }

    /// Density of a light subpath starting here sampling `v` as its second
    /// vertex.
    pub fn pdf_light(&self, scene: &Scene, v: &Self) -> Float {
        let w = v.p() - self.p();
        if w.length_squared() == 0.0 { return 0.0; }
        let inv_dist2 = 1.0 / w.length_squared();
        let w = w * inv_dist2.sqrt();

        let mut pdf = if self.is_infinite_light() {
            // Planar density over the disc of the world bounding sphere
            let (_, radius) = scene.world_bound().bounding_sphere();

            1.0 / (PI * radius * radius)
        } else {
            match self.light_index(scene) {
                Some(l) => {
                    let ray = Ray::new(self.p(), w, INFINITY, self.time(), None);
                    let (_, pdf_dir) = scene.lights[l].pdf_le(&ray, &self.ng());

                    pdf_dir * inv_dist2
                },
                None => return 0.0
            }
        };

        if v.is_on_surface() { pdf *= v.ng().abs_dot_vec(&w); }

        pdf
    }

    /// Density of a light subpath starting at this vertex, light choice
    /// included.
    pub fn pdf_light_origin(&self, ctx: &PathContext, v: &Self) -> Float {
        let w = v.p() - self.p();
        if w.length_squared() == 0.0 { return 0.0; }
        let w = w.normalize();

        if self.is_infinite_light() {
            return infinite_light_density(ctx.scene, ctx.light_distr, &w);
        }

        match self.light_index(ctx.scene) {
            Some(l) => {
                let pdf_choice = ctx.light_distr.discrete_pdf(l);
                let ray = Ray::new(self.p(), w, INFINITY, self.time(), None);
                let (pdf_pos, _) = ctx.scene.lights[l].pdf_le(&ray, &self.ng());

                pdf_pos * pdf_choice
            },
            None => 0.0
        }
    }

    /// Radiance emitted from this vertex toward `v`.
    pub fn le(&self, scene: &Scene, v: &Self) -> Spectrum {
        if !self.is_light(scene) { return Spectrum::new(0.0); }
        let w = v.p() - self.p();
        if w.length_squared() == 0.0 { return Spectrum::new(0.0); }
        let w = w.normalize();

        if self.is_infinite_light() {
            let ray = Ray::new(self.p(), -w, INFINITY, self.time(), None);

            return scene.infinite_lights
                .iter()
                .fold(Spectrum::new(0.0), |acc, &l| acc + scene.lights[l].le(&ray));
        }

        match self.light_index(scene) {
            Some(l) => scene.lights[l].l(self.data(), &w),
            None    => Spectrum::new(0.0)
        }
    }
}

/// Solid angle density of a light subpath leaving an infinite light along
/// `-w`, light choice included.
pub fn infinite_light_density(scene: &Scene, light_distr: &Distribution1D, w: &Vector3f) -> Float {
    let pdf: Float = scene.infinite_lights
        .iter()
        .map(|&l| scene.lights[l].pdf_li(&InteractionData::default(), &-*w) * light_distr.func[l])
        .sum();

    pdf / (light_distr.func_int * light_distr.count() as Float)
}

/// Geometry term between two vertices, including transmittance.
pub fn geometry_term(scene: &Scene, sampler: &mut Samplers, v0: &Vertex, v1: &Vertex) -> Spectrum {
    let d = v0.p() - v1.p();
    let mut g = 1.0 / d.length_squared();
    let d = d * g.sqrt();
    if v0.is_on_surface() { g *= v0.ns().abs_dot_vec(&d); }
    if v1.is_on_surface() { g *= v1.ns().abs_dot_vec(&d); }

    let vis = VisibilityTester::new(*v0.data(), *v1.data());

    vis.tr(scene, sampler) * g
}

/// Subpath storage sized once from the maximum depth.
#[derive(Debug, Clone)]
pub struct Path<'a> {
    vertices: Vec<Vertex<'a>>,
    capacity: usize
}

impl<'a> Path<'a> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { vertices: Vec::with_capacity(capacity), capacity }
    }

    /// Appends a vertex. Exceeding the capacity is a bug in the walk and
    /// panics.
    pub fn push(&mut self, v: Vertex<'a>) {
        assert!(self.vertices.len() < self.capacity, "Path capacity {} exceeded", self.capacity);
        self.vertices.push(v);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    fn last_vertex(&self) -> Vertex<'a> {
        self.vertices[self.vertices.len() - 1]
    }
}

impl<'a> Deref for Path<'a> {
    type Target = [Vertex<'a>];

    fn deref(&self) -> &Self::Target {
        &self.vertices
    }
}

impl<'a> DerefMut for Path<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vertices
    }
}

/// Subpath walk settings.
#[derive(Debug, Copy, Clone)]
pub struct WalkParams {
    /// Largest number of vertices in the subpath.
    pub max_vertices: usize,
    pub rr_depth    : usize
}

/// Traces a camera subpath through the film position `p_film`. Returns the
/// number of vertices.
pub fn generate_camera_subpath<'a>(
    ctx: &PathContext, sampler: &mut Samplers, arena: &Member<'a>,
    walk: WalkParams, p_film: &Point2f, path: &mut Path<'a>) -> usize {
    if walk.max_vertices == 0 { return 0; }

    // Sample initial ray for camera subpath
    let sample = CameraSample { p_film: *p_film, p_lens: sampler.get_2d(), time: sampler.get_1d() };
    let (ray, weight) = ctx.camera.generate_ray(&sample);
    let beta = Spectrum::new(weight);

    // Generate first vertex on camera subpath and start random walk
    path.push(Vertex::create_camera_ray(&ray, beta));
    let (pdf_pos, pdf_dir) = ctx.camera.pdf_we(&ray);
    debug!("Starting camera subpath. Ray: {}, beta {}, pdfPos: {}, pdfDir: {}", ray, beta, pdf_pos, pdf_dir);

    let n = random_walk(
        ctx, ray, sampler, arena, beta, pdf_dir,
        walk.max_vertices - 1, walk.rr_depth, TransportMode::Radiance, path) + 1;
    camera_path_length::report_value(n as u64);

    n
}

/// Traces a light subpath from a light picked from the light distribution.
/// Returns the number of vertices.
pub fn generate_light_subpath<'a>(
    ctx: &PathContext, sampler: &mut Samplers, arena: &Member<'a>,
    walk: WalkParams, time: Float, path: &mut Path<'a>) -> usize {
    if walk.max_vertices == 0 { return 0; }
    let scene = ctx.scene;

    // Sample initial ray for light subpath
    let (light_num, light_pdf) = ctx.light_distr.sample_discrete(sampler.get_1d());
    if light_pdf == 0.0 { return 0; }
    let light = &scene.lights[light_num];
    let u1 = sampler.get_2d();
    let u2 = sampler.get_2d();
    let les = light.sample_le(&u1, &u2, time);
    if les.pdf_pos == 0.0 || les.pdf_dir == 0.0 || les.le.is_black() { return 0; }
    let ray = les.ray;

    // Generate first vertex on light subpath and start random walk
    path.push(Vertex::create_light_ray(scene, light_num, &ray, les.n_light, les.le, les.pdf_pos * light_pdf));
    let beta = les.le * les.n_light.abs_dot_vec(&ray.d) / (light_pdf * les.pdf_pos * les.pdf_dir);
    debug!(
        "Starting light subpath. Ray: {}, Le {}, beta {}, pdfPos: {}, pdfDir: {}",
        ray, les.le, beta, les.pdf_pos, les.pdf_dir);

    let nvertices = random_walk(
        ctx, ray, sampler, arena, beta, les.pdf_dir,
        walk.max_vertices - 1, walk.rr_depth, TransportMode::Importance, path);

    // Correct subpath sampling densities for infinite area lights
    if path[0].is_infinite_light() {
        // Set spatial density of path[1] for infinite area light
        if nvertices > 0 {
            path[1].pdf_fwd = les.pdf_pos;
            if path[1].is_on_surface() {
                path[1].pdf_fwd *= ray.d.abs_dot_norm(&path[1].ng());
            }
        }

        // Set spatial density of path[0] for infinite area light
        path[0].pdf_fwd = infinite_light_density(scene, ctx.light_distr, &ray.d);
    }

    light_path_length::report_value(nvertices as u64 + 1);

    nvertices + 1
}

/// Extends `path` by up to `max_depth` vertices. Interactions are allocated
/// from `arena` so vertices can borrow them.
#[allow(clippy::too_many_arguments)]
fn random_walk<'a>(
    ctx: &PathContext, mut ray: Ray, sampler: &mut Samplers, arena: &Member<'a>,
    mut beta: Spectrum, pdf: Float, max_depth: usize, rr_depth: usize,
    mode: TransportMode, path: &mut Path<'a>) -> usize {
    if max_depth == 0 { return 0; }
    let scene = ctx.scene;
    let mut bounces = 0;
    // Declare variables for forward and reverse probability densities
    let mut pdf_fwd = pdf;
    let mut pdf_rev;

    loop {
        debug!("Random walk. Bounces {}, beta {}, pdfFwd {}", bounces, beta, pdf_fwd);

        // Trace a ray and sample the medium if any
        let hit = scene.intersect(&mut ray);
        let mut mi = None;
        if let Some(m) = ray.medium {
            let (tr, sampled) = scene.medium(m).sample(&ray, sampler);
            beta *= tr;
            mi = sampled;
        }
        if beta.is_black() { break; }

        let prev_idx = path.len() - 1;
        let prev = path.last_vertex();

        if let Some(mi) = mi {
            // Record medium interaction in path and compute forward density
            let mi: &'a MediumInteraction = arena.alloc(mi);
            let vertex = Vertex::create_medium(mi, beta, pdf_fwd, &prev);
            bounces += 1;
            if bounces >= max_depth {
                path.push(vertex);
                break;
            }

            // Sample direction and compute reverse density at preceding vertex
            let (p, wi) = mi.phase.sample_p(&-ray.d, &sampler.get_2d());
            pdf_fwd = p;
            pdf_rev = p;
            ray = mi.spawn_ray(&wi);

            path[prev_idx].pdf_rev = vertex.convert_density(pdf_rev, &prev);
            path.push(vertex);
            continue;
        }

        // Handle surface interaction for path generation
        let mut isect = match hit {
            Some(isect) => isect,
            None        => {
                // Capture escaped rays when tracing from the camera
                if mode == TransportMode::Radiance {
                    path.push(Vertex::create_escaped(&ray, beta, pdf_fwd));
                    bounces += 1;
                }
                break;
            }
        };

        // Compute scattering functions for mode and skip over medium
        // boundaries
        isect.compute_scattering_functions(scene, mode);
        if isect.bsdf.is_none() {
            ray = isect.spawn_ray(&ray.d);
            continue;
        }

        // Initialize vertex with surface intersection information
        let si: &'a SurfaceInteraction = arena.alloc(isect);
        let mut vertex = Vertex::create_surface(si, beta, pdf_fwd, &prev);
        bounces += 1;
        if bounces >= max_depth {
            path.push(vertex);
            break;
        }

        // Sample BSDF at current vertex and compute reverse probability
        let bsdf = match si.bsdf {
            Some(ref b) => b,
            None        => break
        };
        let wo = si.it.wo;
        let s = bsdf.sample_f(&wo, &sampler.get_2d(), BxDFType::All as u8);
        debug!("Random walk sampled dir {} f: {}, pdfFwd: {}", s.wi, s.f, s.pdf);
        pdf_fwd = s.pdf;
        if s.f.is_black() || pdf_fwd == 0.0 {
            path.push(vertex);
            break;
        }

        beta *= s.f * s.wi.abs_dot_norm(&si.shading.n) / pdf_fwd;
        pdf_rev = bsdf.pdf(&s.wi, &wo, BxDFType::All as u8);
        if (s.sampled_type & BxDFType::Specular as u8) != 0 {
            vertex.delta = true;
            pdf_rev = 0.0;
            pdf_fwd = 0.0;
        }
        beta *= correct_shading_normal(si, &wo, &s.wi, mode);
        path[prev_idx].pdf_rev = vertex.convert_density(pdf_rev, &prev);
        path.push(vertex);

        // Possibly terminate the walk with Russian roulette
        if bounces >= rr_depth {
            let q = beta.y().min(0.95);
            if q <= 0.0 || sampler.get_1d() >= q { break; }
            beta /= q;
        }

        ray = si.spawn_ray(&s.wi);
    }

    bounces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn path_overflow_panics() {
        let mut path = Path::with_capacity(1);
        let ray = Ray::default();

        path.push(Vertex::create_camera_ray(&ray, Spectrum::new(1.0)));
        path.push(Vertex::create_camera_ray(&ray, Spectrum::new(1.0)));
    }

    #[test]
    fn convert_density_applies_cosine_and_distance() {
        let a = InteractionData::from_point(Point3f::new(0.0, 0.0, 0.0), 0.0, None);
        let b = InteractionData {
            p: Point3f::new(0.0, 0.0, 2.0),
            n: Normal3f::new(0.0, 0.0, -1.0),
            ..Default::default()
        };
        let va = Vertex::create_camera(&a, Spectrum::new(1.0));
        let vb = Vertex::create_camera(&b, Spectrum::new(1.0));

        assert_eq!(va.convert_density(1.0, &vb), 0.25);
        assert!(vb.is_on_surface());
        assert!(!va.is_on_surface());
    }

    #[test]
    fn escaped_vertex_keeps_solid_angle_density() {
        let a = InteractionData::from_point(Point3f::new(0.0, 0.0, 0.0), 0.0, None);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), INFINITY, 0.0, None);
        let va = Vertex::create_camera(&a, Spectrum::new(1.0));
        let esc = Vertex::create_escaped(&ray, Spectrum::new(1.0), 0.3);

        assert_eq!(va.convert_density(0.7, &esc), 0.7);
        assert_eq!(esc.vtype, VertexType::Light);
    }
}

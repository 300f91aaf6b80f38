//! Scenes built in code. Each takes the image resolution and the output
//! file of the film.

use std::path::Path;
use std::sync::Arc;
use anyhow::{Result, bail};
use log::info;
use crate::accelerators::bvh::BVHAccel;
use crate::cameras::perspective::PerspectiveCamera;
use crate::core::camera::Cameras;
use crate::core::film::Film;
use crate::core::geometry::point::{Point2i, Point3f};
use crate::core::geometry::vector::Vector3f;
use crate::core::light::Lights;
use crate::core::material::Materials;
use crate::core::medium::{MediumId, MediumInterface, Mediums};
use crate::core::pbrt::Float;
use crate::core::primitive::GeometricPrimitive;
use crate::core::scene::Scene;
use crate::core::shape::Shapes;
use crate::core::spectrum::Spectrum;
use crate::lights::diffuse::DiffuseAreaLight;
use crate::lights::infinite::UniformInfiniteLight;
use crate::lights::point::PointLight;
use crate::materials::glass::GlassMaterial;
use crate::materials::matte::MatteMaterial;
use crate::materials::mirror::MirrorMaterial;
use crate::materials::plastic::PlasticMaterial;
use crate::media::homogeneous::HomogeneousMedium;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle::create_quad;

pub const SCENE_NAMES: [&str; 6] = [
    "cornell_box", "emitter_floor", "mirror_sphere", "foggy_box", "point_floor", "sky_floor"];

/// Collects primitives and the area lights attached to them.
#[derive(Default)]
struct SceneBuilder {
    primitives  : Vec<GeometricPrimitive>,
    lights      : Vec<Lights>,
    media       : Vec<Mediums>
}

impl SceneBuilder {
    fn medium(&mut self, m: Mediums) -> MediumId {
        self.media.push(m);
        MediumId(self.media.len() - 1)
    }

    fn shape(&mut self, shapes: Vec<Arc<Shapes>>, material: Option<Arc<Materials>>, mi: MediumInterface) {
        for s in shapes {
            self.primitives.push(GeometricPrimitive::new(s, material.clone(), None, mi));
        }
    }

    /// One-sided emitter; every triangle gets its own area light.
    fn emitter(&mut self, shapes: Vec<Arc<Shapes>>, lemit: Spectrum, material: Option<Arc<Materials>>, mi: MediumInterface) {
        for s in shapes {
            let light = DiffuseAreaLight::new(lemit, s.clone(), false, mi);
            self.lights.push(light.into());
            let area = Some(self.lights.len() - 1);
            self.primitives.push(GeometricPrimitive::new(s, material.clone(), area, mi));
        }
    }

    fn light(&mut self, light: Lights) {
        self.lights.push(light);
    }

    fn build(self) -> Scene {
        info!(
            "Building scene with {} primitives, {} lights, {} media",
            self.primitives.len(), self.lights.len(), self.media.len());
        let aggregate = BVHAccel::new(self.primitives, 4);

        Scene::new(aggregate, self.lights, self.media)
    }
}

fn matte(r: Float, g: Float, b: Float) -> Option<Arc<Materials>> {
    Some(Arc::new(MatteMaterial::new(Spectrum::from_rgb(r, g, b)).into()))
}

fn plastic(kd: Float, ks: Float, roughness: Float) -> Option<Arc<Materials>> {
    Some(Arc::new(PlasticMaterial::new(Spectrum::new(kd), Spectrum::new(ks), roughness, true).into()))
}

fn camera(
    eye: Point3f, look_at: Point3f, fov: Float, resolution: Point2i,
    outfile: &Path, medium: Option<MediumId>) -> Result<Arc<Cameras>> {
    let film = Arc::new(Film::new(resolution, outfile.to_path_buf()));
    let cam = PerspectiveCamera::new(
        eye, look_at, Vector3f::new(0.0, 1.0, 0.0), fov, 0.0, 1.0, film, medium)?;

    Ok(Arc::new(cam.into()))
}

// Square of half-width `h` at height `y`, facing down
fn ceiling_quad(h: Float, y: Float) -> Vec<Arc<Shapes>> {
    create_quad(
        Point3f::new(-h, y, -h), Point3f::new(h, y, -h),
        Point3f::new(h, y, h), Point3f::new(-h, y, h), false)
}

// Square of half-width `h` at height `y`, facing up
fn floor_quad(h: Float, y: Float) -> Vec<Arc<Shapes>> {
    create_quad(
        Point3f::new(-h, y, -h), Point3f::new(-h, y, h),
        Point3f::new(h, y, h), Point3f::new(h, y, -h), false)
}

fn emitter_floor_into(b: &mut SceneBuilder, mi: MediumInterface) {
    b.emitter(ceiling_quad(0.25, 1.0), Spectrum::new(8.0), matte(0.0, 0.0, 0.0), mi);
    b.shape(floor_quad(1.0, 0.0), matte(0.7, 0.7, 0.7), mi);
}

/// One diffuse emitter quad above a diffuse floor.
pub fn emitter_floor(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mut b = SceneBuilder::default();
    emitter_floor_into(&mut b, MediumInterface::default());
    let cam = camera(Point3f::new(0.0, 0.8, 2.5), Point3f::new(0.0, 0.0, 0.0), 45.0, resolution, outfile, None)?;

    Ok((b.build(), cam))
}

/// The emitter and floor with a purely specular sphere resting on the floor.
pub fn mirror_sphere(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mut b = SceneBuilder::default();
    emitter_floor_into(&mut b, MediumInterface::default());
    let mirror: Materials = MirrorMaterial::new(Spectrum::new(0.9)).into();
    let sphere: Shapes = Sphere::new(Point3f::new(0.0, 0.35, 0.0), 0.35, false).into();
    b.shape(vec![Arc::new(sphere)], Some(Arc::new(mirror)), MediumInterface::default());
    let cam = camera(Point3f::new(0.0, 0.8, 2.5), Point3f::new(0.0, 0.3, 0.0), 45.0, resolution, outfile, None)?;

    Ok((b.build(), cam))
}

/// The emitter and floor inside a sphere of homogeneous fog.
pub fn foggy_box(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mut b = SceneBuilder::default();
    let fog = b.medium(HomogeneousMedium::new(&Spectrum::new(0.05), &Spectrum::new(0.25), 0.3).into());
    let inside = MediumInterface::new(Some(fog));
    emitter_floor_into(&mut b, inside);

    // Boundary of the fog, with no material of its own
    let boundary: Shapes = Sphere::new(Point3f::new(0.0, 0.5, 0.0), 4.0, false).into();
    b.shape(vec![Arc::new(boundary)], None, MediumInterface::from_mediums(Some(fog), None));
    let cam = camera(Point3f::new(0.0, 0.8, 2.5), Point3f::new(0.0, 0.0, 0.0), 45.0, resolution, outfile, Some(fog))?;

    Ok((b.build(), cam))
}

/// Diffuse floor lit by a point light.
pub fn point_floor(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mut b = SceneBuilder::default();
    b.shape(floor_quad(1.0, 0.0), matte(0.7, 0.7, 0.7), MediumInterface::default());
    b.light(PointLight::new(Point3f::new(0.0, 1.0, 0.0), Spectrum::new(2.0), MediumInterface::default()).into());
    let cam = camera(Point3f::new(0.0, 0.8, 2.5), Point3f::new(0.0, 0.0, 0.0), 45.0, resolution, outfile, None)?;

    Ok((b.build(), cam))
}

/// Diffuse floor and a glossy plastic sphere under a uniform sky.
pub fn sky_floor(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mut b = SceneBuilder::default();
    b.shape(floor_quad(1.0, 0.0), matte(0.7, 0.7, 0.7), MediumInterface::default());
    let sphere: Shapes = Sphere::new(Point3f::new(0.0, 0.35, 0.0), 0.35, false).into();
    b.shape(vec![Arc::new(sphere)], plastic(0.4, 0.3, 0.1), MediumInterface::default());
    b.light(UniformInfiniteLight::new(Spectrum::new(0.5)).into());
    let cam = camera(Point3f::new(0.0, 0.8, 2.5), Point3f::new(0.0, 0.3, 0.0), 45.0, resolution, outfile, None)?;

    Ok((b.build(), cam))
}

/// Closed box with an opening toward the camera, a ceiling light, a glossy
/// back wall, a mirror sphere and a glass sphere.
pub fn cornell_box(resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    let mi = MediumInterface::default();
    let mut b = SceneBuilder::default();
    let white = matte(0.73, 0.73, 0.73);

    b.shape(floor_quad(1.0, -1.0), white.clone(), mi);
    b.shape(ceiling_quad(1.0, 1.0), white, mi);
    // Back wall, glossy
    b.shape(create_quad(
        Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, -1.0, -1.0),
        Point3f::new(1.0, 1.0, -1.0), Point3f::new(-1.0, 1.0, -1.0), false), plastic(0.6, 0.25, 0.1), mi);
    // Left wall, red
    b.shape(create_quad(
        Point3f::new(-1.0, -1.0, -1.0), Point3f::new(-1.0, 1.0, -1.0),
        Point3f::new(-1.0, 1.0, 1.0), Point3f::new(-1.0, -1.0, 1.0), false), matte(0.63, 0.065, 0.05), mi);
    // Right wall, green
    b.shape(create_quad(
        Point3f::new(1.0, -1.0, -1.0), Point3f::new(1.0, -1.0, 1.0),
        Point3f::new(1.0, 1.0, 1.0), Point3f::new(1.0, 1.0, -1.0), false), matte(0.14, 0.45, 0.091), mi);

    b.emitter(ceiling_quad(0.3, 0.99), Spectrum::new(12.0), matte(0.0, 0.0, 0.0), mi);

    let mirror: Materials = MirrorMaterial::new(Spectrum::new(0.95)).into();
    let glass: Materials = GlassMaterial::new(Spectrum::new(1.0), Spectrum::new(1.0), 1.5).into();
    let s1: Shapes = Sphere::new(Point3f::new(-0.45, -0.65, -0.4), 0.35, false).into();
    let s2: Shapes = Sphere::new(Point3f::new(0.45, -0.65, 0.25), 0.35, false).into();
    b.shape(vec![Arc::new(s1)], Some(Arc::new(mirror)), mi);
    b.shape(vec![Arc::new(s2)], Some(Arc::new(glass)), mi);

    let cam = camera(Point3f::new(0.0, 0.0, 3.6), Point3f::new(0.0, 0.0, 0.0), 40.0, resolution, outfile, None)?;

    Ok((b.build(), cam))
}

/// Builds a scene by name.
pub fn create_scene(name: &str, resolution: Point2i, outfile: &Path) -> Result<(Scene, Arc<Cameras>)> {
    match name {
        "cornell_box"   => cornell_box(resolution, outfile),
        "emitter_floor" => emitter_floor(resolution, outfile),
        "mirror_sphere" => mirror_sphere(resolution, outfile),
        "foggy_box"     => foggy_box(resolution, outfile),
        "point_floor"   => point_floor(resolution, outfile),
        "sky_floor"     => sky_floor(resolution, outfile),
        _ => bail!("Scene \"{}\" unknown, expected one of {:?}", name, SCENE_NAMES)
    }
}

pub mod geometry;
pub mod pbrt;
pub mod medium;
pub mod interaction;
pub mod primitive;
pub mod reflection;
pub mod shape;
pub mod material;
pub mod spectrum;
pub mod camera;
pub mod film;
pub mod light;
pub mod sampling;
pub mod sampler;
pub mod rng;
#[macro_use]
pub mod stats;
pub mod integrator;
pub mod scene;
pub mod parallel;
pub mod microfacet;
pub mod imageio;
pub mod params;

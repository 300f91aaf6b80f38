// lints
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]


// clippy
#![cfg_attr(
    feature = "cargo-clippy",
    allow(
        clippy::upper_case_acronyms,
        clippy::many_single_char_names,
        clippy::too_many_arguments,
        clippy::excessive_precision,
        clippy::float_cmp
    )
)]

pub mod core;
pub mod materials;
pub mod shapes;
pub mod accelerators;
pub mod cameras;
pub mod samplers;
pub mod media;
pub mod lights;
pub mod integrators;
pub mod scenes;

pub fn init_stats() {
    core::stats::init_stats();
    core::integrator::init_stats();
    core::scene::init_stats();
    accelerators::init_stats();
    integrators::init_stats();
    media::init_stats();
}

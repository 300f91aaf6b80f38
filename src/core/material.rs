use std::fmt::{Display, Result, Formatter};
use enum_dispatch::enum_dispatch;
use crate::core::interaction::SurfaceInteraction;
use crate::materials::matte::MatteMaterial;
use crate::materials::mirror::MirrorMaterial;
use crate::materials::glass::GlassMaterial;
use crate::materials::plastic::PlasticMaterial;

/// Which quantity a path carries. Non-symmetric scattering (refraction)
/// is scaled differently for the two.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TransportMode {
    Radiance,
    Importance
}

impl Display for TransportMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TransportMode::Importance => write!(f, "Importance"),
            TransportMode::Radiance   => write!(f, "Radiance")
        }
    }
}

#[enum_dispatch(Materials)]
pub trait Material {
    /// Sets `si.bsdf` for the hit point.
    fn compute_scattering_functions(&self, si: &mut SurfaceInteraction, mode: TransportMode);
}

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Materials {
    MatteMaterial,
    MirrorMaterial,
    GlassMaterial,
    PlasticMaterial
}

use std::fmt::{Display, Result, Formatter};
use enum_dispatch::enum_dispatch;
use log::debug;
use smallvec::SmallVec;
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::point::Point2f;
use crate::core::pbrt::{Float, clamp, INV_PI};
use crate::core::spectrum::Spectrum;
use crate::core::material::TransportMode;
use crate::core::microfacet::{MicrofacetDistribution, MicrofacetDistributions};
use crate::core::sampling::{cosine_sample_hemisphere, remap_discrete_sample};
use crate::core::interaction::SurfaceInteraction;

const MAX_BXDFS: usize = 4;

/// Unpolarized Fresnel reflectance between two dielectrics.
pub fn fr_dielectric(cos_thetai: Float, mut etai: Float, mut etat: Float) -> Float {
    let mut cos_thetai = clamp(cos_thetai, -1.0, 1.0);

    if cos_thetai <= 0.0 {
        std::mem::swap(&mut etai, &mut etat);
        cos_thetai = cos_thetai.abs();
    }

    let sin_thetai = (1.0 - cos_thetai * cos_thetai).max(0.0).sqrt();
    let sin_thetat = etai / etat * sin_thetai;

    // Total internal reflection
    if sin_thetat >= 1.0 { return 1.0; }

    let cos_thetat = (1.0 - sin_thetat * sin_thetat).max(0.0).sqrt();
    let r_parl = ((etat * cos_thetai) - (etai * cos_thetat)) /
                 ((etat * cos_thetai) + (etai * cos_thetat));
    let r_perp = ((etai * cos_thetai) - (etat * cos_thetat)) /
                 ((etai * cos_thetai) + (etat * cos_thetat));

    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

#[inline(always)]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

#[inline(always)]
pub fn cos2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}

#[inline(always)]
pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}

#[inline(always)]
pub fn sin2_theta(w: &Vector3f) -> Float {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[inline(always)]
pub fn tan2_theta(w: &Vector3f) -> Float {
    sin2_theta(w) / cos2_theta(w)
}

#[inline(always)]
pub fn same_hemisphere(w: &Vector3f, wp: &Vector3f) -> bool {
    w.z * wp.z > 0.0
}

pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -*wo + *n * (2.0 * wo.dot(n))
}

/// Refracts `wi` through a boundary with normal `n` on its side and relative
/// index `eta`. `None` on total internal reflection.
pub fn refract(wi: &Vector3f, n: &Normal3f, eta: Float) -> Option<Vector3f> {
    let cos_thetai = n.dot_vec(wi);
    let sin2_thetai = (1.0 - cos_thetai * cos_thetai).max(0.0);
    let sin2_thetat = eta * eta * sin2_thetai;
    if sin2_thetat >= 1.0 { return None; }

    let cos_thetat = (1.0 - sin2_thetat).sqrt();

    Some(-*wi * eta + Vector3f::from(*n) * (eta * cos_thetai - cos_thetat))
}

#[repr(u8)]
#[derive(Copy, Clone)]
pub enum BxDFType {
    Reflection      = 1 << 0,
    Transmission    = 1 << 1,
    Diffuse         = 1 << 2,
    Glossy          = 1 << 3,
    Specular        = 1 << 4,
    All             = 31
}

#[inline]
pub fn is_specular(ty: u8) -> bool {
    ty & BxDFType::Specular as u8 != 0
}

#[inline]
pub fn is_diffuse_reflection(ty: u8) -> bool {
    let dr = BxDFType::Diffuse as u8 | BxDFType::Reflection as u8;

    ty & dr == dr
}

/// Outcome of sampling a scattering direction. A zero `pdf` means no
/// direction was produced.
#[derive(Debug, Default, Copy, Clone)]
pub struct BSDFSample {
    pub f           : Spectrum,
    pub wi          : Vector3f,
    pub pdf         : Float,
    pub sampled_type: u8
}

#[enum_dispatch]
pub trait Fresnel {
    fn evaluate(&self, cosi: Float) -> Spectrum;
}

#[enum_dispatch(Fresnel)]
#[derive(Debug, Copy, Clone)]
pub enum Fresnels {
    FresnelDielectric,
    FresnelNoOp
}

#[derive(Debug, Copy, Clone)]
pub struct FresnelDielectric {
    etai: Float,
    etat: Float
}

impl FresnelDielectric {
    pub fn new(etai: Float, etat: Float) -> Self {
        Self { etai, etat }
    }
}

impl Fresnel for FresnelDielectric {
    fn evaluate(&self, cosi: Float) -> Spectrum {
        Spectrum::new(fr_dielectric(cosi, self.etai, self.etat))
    }
}

/// Reflects everything.
#[derive(Debug, Copy, Clone)]
pub struct FresnelNoOp;

impl Fresnel for FresnelNoOp {
    fn evaluate(&self, _cosi: Float) -> Spectrum {
        Spectrum::new(1.0)
    }
}

/// Local-frame scattering lobe. Directions are expressed in the shading
/// frame where the normal is +z.
#[enum_dispatch]
pub trait BxDF {
    fn get_type(&self) -> u8;

    fn matches_flags(&self, t: u8) -> bool {
        self.get_type() & t == self.get_type()
    }

    fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum;

    fn sample_f(&self, wo: &Vector3f, u: &Point2f) -> BSDFSample {
        let mut wi = cosine_sample_hemisphere(u);
        if wo.z < 0.0 { wi.z = -wi.z; }

        BSDFSample {
            f: self.f(wo, &wi),
            wi,
            pdf: self.pdf(wo, &wi),
            sampled_type: self.get_type()
        }
    }

    fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if same_hemisphere(wo, wi) { abs_cos_theta(wi) * INV_PI } else { 0.0 }
    }
}

#[enum_dispatch(BxDF)]
#[derive(Debug, Clone)]
pub enum BxDFs {
    LambertianReflection,
    SpecularReflection,
    FresnelSpecular,
    MicrofacetReflection
}

impl Display for BxDFs {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            BxDFs::LambertianReflection(b) => write!(f, "[ LambertianReflection R: {} ]", b.r),
            BxDFs::SpecularReflection(b)   => write!(f, "[ SpecularReflection R: {} ]", b.r),
            BxDFs::FresnelSpecular(b)      =>
                write!(f, "[ FresnelSpecular R: {} T: {} etaA: {} etaB: {} ]", b.r, b.t, b.etaa, b.etab),
            BxDFs::MicrofacetReflection(b) => write!(f, "[ MicrofacetReflection R: {} ]", b.r)
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct LambertianReflection {
    r: Spectrum
}

impl LambertianReflection {
    pub fn new(r: Spectrum) -> Self {
        Self { r }
    }
}

impl BxDF for LambertianReflection {
    fn get_type(&self) -> u8 {
        BxDFType::Reflection as u8 | BxDFType::Diffuse as u8
    }

    fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        self.r * INV_PI
    }
}

#[derive(Debug, Copy, Clone)]
pub struct SpecularReflection {
    r       : Spectrum,
    fresnel : Fresnels
}

impl SpecularReflection {
    pub fn new(r: Spectrum, fresnel: Fresnels) -> Self {
        Self { r, fresnel }
    }
}

impl BxDF for SpecularReflection {
    fn get_type(&self) -> u8 {
        BxDFType::Reflection as u8 | BxDFType::Specular as u8
    }

    fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        Spectrum::default()
    }

    fn sample_f(&self, wo: &Vector3f, _u: &Point2f) -> BSDFSample {
        let wi = Vector3f::new(-wo.x, -wo.y, wo.z);

        BSDFSample {
            f: self.fresnel.evaluate(cos_theta(&wi)) * self.r / abs_cos_theta(&wi),
            wi,
            pdf: 1.0,
            sampled_type: self.get_type()
        }
    }

    fn pdf(&self, _wo: &Vector3f, _wi: &Vector3f) -> Float {
        0.0
    }
}

/// Smooth dielectric choosing reflection or transmission by the Fresnel term.
#[derive(Debug, Copy, Clone)]
pub struct FresnelSpecular {
    r       : Spectrum,
    t       : Spectrum,
    etaa    : Float,
    etab    : Float,
    mode    : TransportMode
}

impl FresnelSpecular {
    pub fn new(r: Spectrum, t: Spectrum, etaa: Float, etab: Float, mode: TransportMode) -> Self {
        Self { r, t, etaa, etab, mode }
    }
}

impl BxDF for FresnelSpecular {
    fn get_type(&self) -> u8 {
        BxDFType::Reflection as u8 | BxDFType::Transmission as u8 | BxDFType::Specular as u8
    }

    fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        Spectrum::default()
    }

    fn sample_f(&self, wo: &Vector3f, u: &Point2f) -> BSDFSample {
        let fr = fr_dielectric(cos_theta(wo), self.etaa, self.etab);

        if u.x < fr {
            let wi = Vector3f::new(-wo.x, -wo.y, wo.z);

            return BSDFSample {
                f: self.r * fr / abs_cos_theta(&wi),
                wi,
                pdf: fr,
                sampled_type: BxDFType::Specular as u8 | BxDFType::Reflection as u8
            };
        }

        let (etai, etat) = if cos_theta(wo) > 0.0 {
            (self.etaa, self.etab)
        } else {
            (self.etab, self.etaa)
        };

        let n = Normal3f::new(0.0, 0.0, 1.0).face_forward(wo);
        let wi = match refract(wo, &n, etai / etat) {
            Some(wi) => wi,
            None     => return BSDFSample::default()
        };

        let mut ft = self.t * (1.0 - fr);
        // Radiance is compressed when entering a denser medium
        if self.mode == TransportMode::Radiance {
            ft *= (etai * etai) / (etat * etat);
        }

        BSDFSample {
            f: ft / abs_cos_theta(&wi),
            wi,
            pdf: 1.0 - fr,
            sampled_type: BxDFType::Specular as u8 | BxDFType::Transmission as u8
        }
    }

    fn pdf(&self, _wo: &Vector3f, _wi: &Vector3f) -> Float {
        0.0
    }
}

#[derive(Debug, Copy, Clone)]
pub struct MicrofacetReflection {
    r           : Spectrum,
    distribution: MicrofacetDistributions,
    fresnel     : Fresnels
}

impl MicrofacetReflection {
    pub fn new(r: Spectrum, distribution: MicrofacetDistributions, fresnel: Fresnels) -> Self {
        Self { r, distribution, fresnel }
    }
}

impl BxDF for MicrofacetReflection {
    fn get_type(&self) -> u8 {
        BxDFType::Reflection as u8 | BxDFType::Glossy as u8
    }

    fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        let cos_o = abs_cos_theta(wo);
        let cos_i = abs_cos_theta(wi);
        let wh = *wi + *wo;

        if cos_i == 0.0 || cos_o == 0.0 { return Spectrum::default(); }
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 { return Spectrum::default(); }

        let wh = wh.normalize();
        let fr = self.fresnel.evaluate(wi.dot(&wh.face_forward(&Vector3f::new(0.0, 0.0, 1.0))));

        self.r * fr * (self.distribution.d(&wh) * self.distribution.g(wo, wi) / (4.0 * cos_i * cos_o))
    }

    fn sample_f(&self, wo: &Vector3f, u: &Point2f) -> BSDFSample {
        if wo.z == 0.0 { return BSDFSample::default(); }

        let wh = self.distribution.sample_wh(wo, u);
        if wo.dot(&wh) < 0.0 { return BSDFSample::default(); }

        let wi = reflect(wo, &wh);
        if !same_hemisphere(wo, &wi) { return BSDFSample::default(); }

        BSDFSample {
            f: self.f(wo, &wi),
            wi,
            pdf: self.distribution.pdf(wo, &wh) / (4.0 * wo.dot(&wh)),
            sampled_type: self.get_type()
        }
    }

    fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !same_hemisphere(wo, wi) { return 0.0; }
        let wh = (*wo + *wi).normalize();

        self.distribution.pdf(wo, &wh) / (4.0 * wo.dot(&wh))
    }
}

/// Collection of lobes at one surface point, with the shading frame used to
/// move directions between world and local space.
#[derive(Debug, Clone)]
pub struct BSDF {
    pub eta     : Float,
    ns          : Normal3f,
    ng          : Normal3f,
    ss          : Vector3f,
    ts          : Vector3f,
    bxdfs       : SmallVec<[BxDFs; MAX_BXDFS]>
}

impl BSDF {
    pub fn new(si: &SurfaceInteraction, eta: Float) -> Self {
        let ns = si.shading.n;
        let ss = si.shading.dpdu.normalize();

        Self {
            eta, ns, ss,
            ng: si.it.n,
            ts: ns.cross_vec(&ss),
            bxdfs: SmallVec::new()
        }
    }

    pub fn add(&mut self, b: BxDFs) {
        debug_assert!(self.bxdfs.len() < MAX_BXDFS);
        self.bxdfs.push(b);
    }

    pub fn num_components(&self, flags: u8) -> usize {
        self.bxdfs.iter().filter(|b| b.matches_flags(flags)).count()
    }

    pub fn world_to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.ss), v.dot(&self.ts), v.dot_norm(&self.ns))
    }

    pub fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(
            self.ss.x * v.x + self.ts.x * v.y + self.ns.x * v.z,
            self.ss.y * v.x + self.ts.y * v.y + self.ns.y * v.z,
            self.ss.z * v.x + self.ts.z * v.y + self.ns.z * v.z)
    }

    fn sum_f(&self, wo: &Vector3f, wi: &Vector3f, reflect: bool, flags: u8) -> Spectrum {
        let side = if reflect { BxDFType::Reflection as u8 } else { BxDFType::Transmission as u8 };

        self.bxdfs.iter()
            .filter(|b| b.matches_flags(flags) && b.get_type() & side != 0)
            .fold(Spectrum::default(), |acc, b| acc + b.f(wo, wi))
    }

    pub fn f(&self, wow: &Vector3f, wiw: &Vector3f, flags: u8) -> Spectrum {
        let wi = self.world_to_local(wiw);
        let wo = self.world_to_local(wow);
        if wo.z == 0.0 { return Spectrum::default(); }

        let reflect = wiw.dot_norm(&self.ng) * wow.dot_norm(&self.ng) > 0.0;

        self.sum_f(&wo, &wi, reflect, flags)
    }

    /// Picks one matching lobe with `u.x`, samples it and returns the combined
    /// value and density of all matching lobes for the sampled direction.
    pub fn sample_f(&self, wow: &Vector3f, u: &Point2f, flags: u8) -> BSDFSample {
        let matching = self.num_components(flags);
        if matching == 0 { return BSDFSample::default(); }

        let comp = ((u.x * matching as Float).floor() as usize).min(matching - 1);
        let (idx, b) = match self.bxdfs.iter().enumerate().filter(|(_, b)| b.matches_flags(flags)).nth(comp) {
            Some(found) => found,
            None        => return BSDFSample::default()
        };

        let uremapped = Point2f::new(remap_discrete_sample(u.x, matching, comp), u.y);
        let wo = self.world_to_local(wow);
        if wo.z == 0.0 { return BSDFSample::default(); }

        let mut s = b.sample_f(&wo, &uremapped);
        if s.pdf == 0.0 {
            return BSDFSample::default();
        }

        let wi = s.wi;
        s.wi = self.local_to_world(&wi);

        if !is_specular(b.get_type()) && matching > 1 {
            for (i, other) in self.bxdfs.iter().enumerate() {
                if i != idx && other.matches_flags(flags) {
                    s.pdf += other.pdf(&wo, &wi);
                }
            }
        }
        if matching > 1 { s.pdf /= matching as Float; }

        if !is_specular(b.get_type()) {
            let reflect = s.wi.dot_norm(&self.ng) * wow.dot_norm(&self.ng) > 0.0;
            s.f = self.sum_f(&wo, &wi, reflect, flags);
        }

        debug!("BSDF::sample_f chose {} of {}: f = {}, pdf = {}", b, matching, s.f, s.pdf);

        s
    }

    pub fn pdf(&self, wow: &Vector3f, wiw: &Vector3f, flags: u8) -> Float {
        if self.bxdfs.is_empty() { return 0.0; }

        let wo = self.world_to_local(wow);
        let wi = self.world_to_local(wiw);
        if wo.z == 0.0 { return 0.0; }

        let (count, pdf) = self.bxdfs.iter()
            .filter(|b| b.matches_flags(flags))
            .fold((0, 0.0), |(n, p), b| (n + 1, p + b.pdf(&wo, &wi)));

        if count > 0 { pdf / count as Float } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use crate::core::geometry::point::Point3f;
    use crate::core::pbrt::PI;

    fn flat_interaction() -> SurfaceInteraction {
        SurfaceInteraction::new(
            Point3f::default(), Vector3f::default(), Point2f::default(),
            Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(1.0, 0.0, 0.0),
            Normal3f::new(0.0, 0.0, 1.0), 0.0)
    }

    #[test]
    fn lambertian_value_and_density() {
        let mut bsdf = BSDF::new(&flat_interaction(), 1.0);
        bsdf.add(LambertianReflection::new(Spectrum::new(0.5)).into());

        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let wi = Vector3f::new(0.6, 0.0, 0.8);
        let f = bsdf.f(&wo, &wi, BxDFType::All as u8);

        assert!(relative_eq!(f[0], 0.5 / PI));
        assert!(relative_eq!(bsdf.pdf(&wo, &wi, BxDFType::All as u8), 0.8 / PI));
        assert_eq!(bsdf.f(&wo, &-wi, BxDFType::All as u8), Spectrum::default());
    }

    #[test]
    fn mirror_reflects_about_normal() {
        let mut bsdf = BSDF::new(&flat_interaction(), 1.0);
        bsdf.add(SpecularReflection::new(Spectrum::new(1.0), FresnelNoOp.into()).into());

        let wo = Vector3f::new(0.6, 0.0, 0.8);
        let s = bsdf.sample_f(&wo, &Point2f::new(0.3, 0.3), BxDFType::All as u8);

        assert!(is_specular(s.sampled_type));
        assert!(relative_eq!(s.wi.x, -0.6));
        assert!(relative_eq!(s.wi.z, 0.8));
        assert!(relative_eq!(s.f[0] * s.wi.z / s.pdf, 1.0));
        assert_eq!(bsdf.num_components(BxDFType::All as u8 & !(BxDFType::Specular as u8)), 0);
    }

    #[test]
    fn dielectric_reflectance_at_normal_incidence() {
        let r = fr_dielectric(1.0, 1.0, 1.5);

        assert!(relative_eq!(r, 0.04, epsilon = 1e-4));
        assert!(relative_eq!(fr_dielectric(0.1, 1.5, 1.0), 1.0));
    }
}

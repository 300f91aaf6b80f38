use std::path::PathBuf;
use std::str::FromStr;
use std::fmt::{Display, Formatter, Result as FmtResult};
use anyhow::{Result, anyhow, bail, Context};
use log::debug;
use crate::core::pbrt::Float;
use crate::core::integrator::LightSampleStrategy;
use crate::integrators::radius::RadiusMode;

/// Render options read by the integrators. Built from defaults, overridden
/// key by key and validated once before rendering starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub sample_count            : usize,
    pub max_depth               : usize,
    pub photon_count            : usize,
    pub gather_photons          : usize,
    pub gather_radius           : Option<Float>,
    pub global_lookup_radius    : Float,
    pub lookup_radius_ratio     : Float,
    pub lookup_size             : usize,
    pub radius_mode             : RadiusMode,
    pub light_sample_strategy   : LightSampleStrategy,
    pub seed                    : u64,
    pub nthreads                : usize,
    pub outfile                 : PathBuf,
    pub rr_depth                : usize,
    pub save_every_iteration    : bool
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            sample_count            : 16,
            max_depth               : 5,
            photon_count            : 100_000,
            gather_photons          : 32,
            gather_radius           : None,
            global_lookup_radius    : 0.125,
            lookup_radius_ratio     : 0.8,
            lookup_size             : 32,
            radius_mode             : RadiusMode::Global,
            light_sample_strategy   : LightSampleStrategy::Power,
            seed                    : 0,
            nthreads                : 0,
            outfile                 : PathBuf::from("image.png"),
            rr_depth                : 3,
            save_every_iteration    : true
        }
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value \"{}\" for parameter \"{}\"", value, key))
}

impl RenderParams {
    /// Overrides one parameter from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        debug!("Setting parameter \"{}\" to \"{}\"", key, value);

        match key {
            "sampleCount"           => self.sample_count = parse(key, value)?,
            "maxDepth" |
            "maxBounces"            => self.max_depth = parse(key, value)?,
            "photonCount"           => self.photon_count = parse(key, value)?,
            "gatherPhotons"         => self.gather_photons = parse(key, value)?,
            "gatherRadius"          => self.gather_radius = Some(parse(key, value)?),
            "globalLookupRadius"    => self.global_lookup_radius = parse(key, value)?,
            "lookupRadiusRatio"     => self.lookup_radius_ratio = parse(key, value)?,
            "lookupSize"            => self.lookup_size = parse(key, value)?,
            "radiusMode"            => self.radius_mode = value.parse()?,
            "lightSampleStrategy"   => self.light_sample_strategy = value.parse()?,
            "seed"                  => self.seed = parse(key, value)?,
            "nThreads"              => self.nthreads = parse(key, value)?,
            "outfile"               => self.outfile = PathBuf::from(value),
            "rrDepth"               => self.rr_depth = parse(key, value)?,
            "saveEveryIteration"    => self.save_every_iteration = parse(key, value)?,
            _ => bail!("Unknown parameter \"{}\"", key)
        }

        Ok(())
    }

    /// Applies `key=value` assignments in order.
    pub fn set_all<S: AsRef<str>>(&mut self, assignments: &[S]) -> Result<()> {
        for a in assignments {
            let a = a.as_ref();
            let (key, value) = a
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected key=value, got \"{}\"", a))?;
            self.set(key.trim(), value)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            bail!("\"sampleCount\" must be at least 1");
        }
        if self.photon_count == 0 {
            bail!("\"photonCount\" must be at least 1");
        }
        if self.gather_photons == 0 {
            bail!("\"gatherPhotons\" must be positive, got 0");
        }
        if self.lookup_size == 0 {
            bail!("\"lookupSize\" must be positive, got 0");
        }
        if !(self.lookup_radius_ratio > 0.0 && self.lookup_radius_ratio < 1.0) {
            bail!("\"lookupRadiusRatio\" must lie in (0, 1), got {}", self.lookup_radius_ratio);
        }
        if !(self.global_lookup_radius > 0.0) || !self.global_lookup_radius.is_finite() {
            bail!("\"globalLookupRadius\" must be positive, got {}", self.global_lookup_radius);
        }
        if let Some(r) = self.gather_radius {
            if !(r > 0.0) || !r.is_finite() {
                bail!("\"gatherRadius\" must be positive, got {}", r);
            }
        }

        Ok(())
    }
}

impl Display for RenderParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "[ RenderParams sampleCount: {} maxDepth: {} photonCount: {} gatherPhotons: {} \
            globalLookupRadius: {} lookupRadiusRatio: {} lookupSize: {} radiusMode: {} \
            lightSampleStrategy: {} seed: {} ]",
            self.sample_count, self.max_depth, self.photon_count, self.gather_photons,
            self.global_lookup_radius, self.lookup_radius_ratio, self.lookup_size,
            self.radius_mode, self.light_sample_strategy, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_set_the_same_field() {
        let mut p = RenderParams::default();
        p.set("maxBounces", "7").unwrap();
        assert_eq!(p.max_depth, 7);
        p.set("maxDepth", "2").unwrap();
        assert_eq!(p.max_depth, 2);
    }

    #[test]
    fn assignments_are_split_on_equals() {
        let mut p = RenderParams::default();
        p.set_all(&["sampleCount=4", "gatherRadius = 0.5", "outfile=out.exr"]).unwrap();

        assert_eq!(p.sample_count, 4);
        assert_eq!(p.gather_radius, Some(0.5));
        assert_eq!(p.outfile, PathBuf::from("out.exr"));
        assert!(p.set_all(&["sampleCount"]).is_err());
    }

    #[test]
    fn bad_values_name_the_key() {
        let mut p = RenderParams::default();
        let err = p.set("photonCount", "lots").unwrap_err();

        assert!(format!("{}", err).contains("photonCount"));
        assert!(p.set("noSuchKey", "1").is_err());
    }
}

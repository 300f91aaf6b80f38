use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{error, info};
use ndarray::Array2;
use crate::core::geometry::point::{Point2i, Point2f};
use crate::core::geometry::bounds::Bounds2i;
use crate::core::spectrum::Spectrum;
use crate::core::parallel::AtomicFloat;
use crate::core::pbrt::Float;
use crate::core::imageio::write_image;

#[derive(Debug, Default)]
struct Pixel {
    rgb     : [AtomicFloat; 3],
    splat   : [AtomicFloat; 3]
}

impl Pixel {
    fn value(&self) -> [Float; 3] {
        [
            self.rgb[0].load() + self.splat[0].load(),
            self.rgb[1].load() + self.splat[1].load(),
            self.rgb[2].load() + self.splat[2].load()
        ]
    }
}

/// Running sum of radiance per pixel, shared by all render threads.
///
/// Every pass adds one sample per pixel, so the image written after `n`
/// passes is the sum scaled by `1 / n`. Camera-path samples and light-path
/// splats are kept apart but written summed.
#[derive(Debug)]
pub struct Film {
    pub full_resolution : Point2i,
    pub filename        : PathBuf,
    pixels              : Array2<Pixel>
}

impl Film {
    pub fn new(resolution: Point2i, filename: PathBuf) -> Self {
        let (w, h) = (resolution.x.max(0) as usize, resolution.y.max(0) as usize);
        info!("Created film with resolution {} x {}", w, h);

        Self {
            full_resolution: resolution,
            filename,
            pixels: Array2::from_shape_fn((h, w), |_| Pixel::default())
        }
    }

    pub fn bounds(&self) -> Bounds2i {
        Bounds2i::new(Point2i::new(0, 0), self.full_resolution)
    }

    pub fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    fn accepts(&self, what: &str, x: Float, y: Float, l: &Spectrum) -> bool {
        if l.has_nans() {
            error!("Ignoring {} with NaN values at ({}, {})", what, x, y);
            false
        } else if !l.is_finite() {
            error!("Ignoring {} with infinite value at ({}, {})", what, x, y);
            false
        } else if l.min_component_value() < 0.0 {
            error!("Ignoring {} with negative value {} at ({}, {})", what, l.min_component_value(), x, y);
            false
        } else {
            true
        }
    }

    /// Adds radiance estimated for pixel `p`.
    pub fn add_sample(&self, p: &Point2i, l: Spectrum) {
        if !self.accepts("sample", p.x as Float, p.y as Float, &l) { return; }
        if !self.bounds().inside_exclusive(p) { return; }

        let pixel = &self.pixels[[p.y as usize, p.x as usize]];
        for (c, v) in pixel.rgb.iter().zip(l.to_rgb().iter()) {
            c.add(*v);
        }
    }

    /// Adds radiance that reached the film at the continuous raster position `p`.
    pub fn add_splat(&self, p: &Point2f, l: Spectrum) {
        if !self.accepts("splatted spectrum", p.x, p.y, &l) { return; }

        let pi = Point2i::new(p.x.floor() as i32, p.y.floor() as i32);
        if !self.bounds().inside_exclusive(&pi) { return; }

        let pixel = &self.pixels[[pi.y as usize, pi.x as usize]];
        for (c, v) in pixel.splat.iter().zip(l.to_rgb().iter()) {
            c.add(*v);
        }
    }

    /// Unscaled accumulated value of pixel `p`.
    pub fn pixel(&self, p: &Point2i) -> Spectrum {
        let [r, g, b] = self.pixels[[p.y as usize, p.x as usize]].value();

        Spectrum::from_rgb(r, g, b)
    }

    pub fn clear(&self) {
        for pixel in self.pixels.iter() {
            for c in pixel.rgb.iter().chain(pixel.splat.iter()) {
                c.store(0.0);
            }
        }
    }

    /// Scaled RGB triples in scanline order.
    pub fn to_rgb(&self, scale: Float) -> Vec<Float> {
        self.pixels
            .iter()
            .flat_map(|p| p.value().to_vec())
            .map(|v| (v * scale).max(0.0))
            .collect()
    }

    /// Path written for a numbered snapshot: `<stem>_<n>.<ext>`.
    pub fn snapshot_path(&self, n: usize) -> PathBuf {
        snapshot_name(&self.filename, n)
    }

    /// Writes the image scaled by `scale`, to the film's file or to the
    /// snapshot file of pass `iteration` when given. Returns the path written.
    pub fn write_image(&self, scale: Float, iteration: Option<usize>) -> Result<PathBuf> {
        let path = match iteration {
            Some(n) => self.snapshot_path(n),
            None    => self.filename.clone()
        };

        write_image(&path, &self.to_rgb(scale), &self.full_resolution)
            .with_context(|| format!("Failed to write film to \"{}\"", path.display()))?;

        Ok(path)
    }
}

fn snapshot_name(filename: &Path, n: usize) -> PathBuf {
    let stem = filename.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let name = match filename.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, n, ext),
        None      => format!("{}_{}", stem, n)
    };

    filename.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn rejects_invalid_radiance() {
        let film = Film::new(Point2i::new(2, 2), PathBuf::from("t.png"));
        let p = Point2i::new(1, 0);

        film.add_sample(&p, Spectrum::new(Float::NAN));
        film.add_sample(&p, Spectrum::new(Float::INFINITY));
        film.add_sample(&p, Spectrum::new(-1.0));
        // Positive luminance, one negative channel
        film.add_sample(&p, Spectrum::from_rgb(1.0, -0.1, 1.0));
        assert!(film.pixel(&p).is_black());

        film.add_sample(&p, Spectrum::new(0.5));
        film.add_splat(&Point2f::new(1.5, 0.2), Spectrum::new(0.25));
        assert!(relative_eq!(film.pixel(&p)[1], 0.75));

        film.clear();
        assert!(film.pixel(&p).is_black());
    }

    #[test]
    fn splats_outside_are_dropped() {
        let film = Film::new(Point2i::new(2, 2), PathBuf::from("t.png"));
        film.add_splat(&Point2f::new(2.0, 0.5), Spectrum::new(1.0));
        film.add_splat(&Point2f::new(-0.1, 0.5), Spectrum::new(1.0));

        assert!(film.to_rgb(1.0).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn snapshot_names_keep_extension() {
        let film = Film::new(Point2i::new(1, 1), PathBuf::from("out/render.exr"));

        assert_eq!(film.snapshot_path(3), PathBuf::from("out/render_3.exr"));
    }
}

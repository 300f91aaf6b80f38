use std::path::Path;
use anyhow::{Result, Context, anyhow};
use exr::prelude::*;
use log::info;
use crate::core::geometry::point::Point2i;
use crate::core::pbrt::{Float, clamp, gamma_correct};

type Pixel = (f32, f32, f32);

/// Writes linear RGB triples in row-major order, picking the encoder from
/// the file extension.
pub fn write_image<P: AsRef<Path>>(name: P, rgb: &[Float], res: &Point2i) -> Result<()> {
    let ext = name.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .with_context(|| format!("Failed to get filename extension \"{}\"", name.as_ref().display()))?;

    let expected = 3 * (res.x.max(0) * res.y.max(0)) as usize;
    if rgb.len() != expected {
        return Err(anyhow!(
            "Image \"{}\" has {} values, expected {} for {} x {}",
            name.as_ref().display(), rgb.len(), expected, res.x, res.y));
    }

    match ext.to_ascii_lowercase().as_str() {
        "png" => write_image_png(&name, rgb, res),
        "exr" => write_image_exr(&name, rgb, res),
        _     => Err(anyhow!("Unsupported file format \"{}\"", ext))
    }?;

    info!("Wrote image {} ({} X {})", name.as_ref().display(), res.x, res.y);

    Ok(())
}

fn write_image_exr<P: AsRef<Path>>(name: P, rgb: &[Float], res: &Point2i) -> Result<()> {
    let width = res.x as usize;
    let data = rgb.chunks(3).map(|p| (p[0], p[1], p[2])).collect::<Vec<Pixel>>();

    write_rgb_f32_file(
        name.as_ref(),
        (width, res.y as usize),
        |x, y| data[y * width + x]
    )
        .with_context(|| format!("Error writing exr image \"{}\"", name.as_ref().display()))
}

fn write_image_png<P: AsRef<Path>>(name: P, rgb: &[Float], res: &Point2i) -> Result<()> {
    let buf = rgb
        .iter()
        .map(|v| clamp(255.0 * gamma_correct(*v) + 0.5, 0.0, 255.0) as u8)
        .collect::<Vec<_>>();

    image::save_buffer(
        name.as_ref(),
        &buf,
        res.x as u32,
        res.y as u32,
        image::ColorType::Rgb8
    )
        .with_context(|| format!("Error writing image \"{}\"", name.as_ref().display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_extension() {
        let rgb = vec![0.5; 12];
        let err = write_image("out.bmp3", &rgb, &Point2i::new(2, 2)).unwrap_err();

        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let rgb = vec![0.5; 9];

        assert!(write_image("out.png", &rgb, &Point2i::new(2, 2)).is_err());
    }
}

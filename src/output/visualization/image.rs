//! Concentration preview images
//!
//! Writes the RGBA preview of [`SimulationResult::concentration_image`] to a
//! file, each voxel drawn as a `scale` x `scale` block. Pixels outside every
//! compartment take the background colour.

use std::error::Error;

use ndarray::Array3;
use plotters::prelude::*;

use crate::solver::SimulationResult;

/// Save the preview of layer `z` at time point `t`
///
/// `.svg` paths give a vector image, anything else a bitmap.
///
/// # Errors
///
/// Returns `Err` if `t` or `z` is out of range, `scale` is zero, or the
/// backend cannot write to `output_path`.
pub fn save_concentration_image(
    result: &SimulationResult,
    t: usize,
    z: usize,
    scale: u32,
    output_path: &str,
) -> Result<(), Box<dyn Error>> {
    if scale == 0 {
        return Err("Image scale must be positive".into());
    }
    let image = result
        .concentration_image(t, z)
        .ok_or_else(|| format!("No image for time point {} and layer {}", t, z))?;

    let (height, width, _) = image.dim();
    let size = (width as u32 * scale, height as u32 * scale);

    let ext = std::path::Path::new(output_path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("png");

    match ext {
        "svg" => draw_image(SVGBackend::new(output_path, size), &image, scale),
        _ => draw_image(BitMapBackend::new(output_path, size), &image, scale),
    }
}

fn draw_image<DB: DrawingBackend>(backend: DB, image: &Array3<u8>, scale: u32) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let scale = scale as i32;
    let (height, width, _) = image.dim();
    for y in 0..height {
        for x in 0..width {
            if image[[y, x, 3]] == 0 {
                continue;
            }
            let colour = RGBColor(image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]]);
            let (x0, y0) = (x as i32 * scale, y as i32 * scale);
            root.draw(&Rectangle::new([(x0, y0), (x0 + scale, y0 + scale)], colour.filled()))?;
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::library::{diffusion_cube, diffusion_spot};
    use crate::physics::MathBackend;
    use crate::solver::{Simulation, SimulatorType};

    #[test]
    fn test_save_png() {
        let (model, geometry) = diffusion_spot(8).unwrap();
        let mut sim = Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted).unwrap();
        sim.advance(0.1);

        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("png");
        save_concentration_image(sim.result(), 1, 0, 4, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_svg_middle_layer() {
        let (model, geometry) = diffusion_cube(4).unwrap();
        let sim = Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted).unwrap();

        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("svg");
        save_concentration_image(sim.result(), 0, 2, 2, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_out_of_range_is_error() {
        let (model, geometry) = diffusion_spot(4).unwrap();
        let sim = Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted).unwrap();

        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("png");
        let path = path.to_str().unwrap();
        assert!(save_concentration_image(sim.result(), 3, 0, 2, path).is_err());
        assert!(save_concentration_image(sim.result(), 0, 1, 2, path).is_err());
        assert!(save_concentration_image(sim.result(), 0, 0, 0, path).is_err());
    }
}

//! Concentration against time
//!
//! One curve per species: the spatial average over its compartment at every
//! recorded time point, optionally with the minimum and maximum as a faint
//! band around it.
//!
//! ```rust,ignore
//! use pixsim_rs::output::visualization::{plot_time_series, PlotConfig};
//!
//! // Every compartment
//! plot_time_series(sim.result(), None, "averages.png", None)?;
//!
//! // Only compartment 1, as SVG
//! let config = PlotConfig::time_series("Nucleus");
//! plot_time_series(sim.result(), Some(1), "nucleus.svg", Some(&config))?;
//! ```

use std::error::Error;

use plotters::prelude::*;

use super::config::PlotConfig;
use crate::solver::SimulationResult;

/// One curve of the plot
struct Curve {
    label: String,
    colour: Option<[u8; 3]>,
    avg: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
}

/// Collect the statistics of every species of the selected compartments
fn extract_curves(result: &SimulationResult, compartment: Option<usize>) -> Vec<Curve> {
    let ids = result.compartment_ids();
    let selected: Vec<usize> = match compartment {
        Some(c) if c < ids.len() => vec![c],
        Some(_) => Vec::new(),
        None => (0..ids.len()).collect(),
    };

    let mut curves = Vec::new();
    for c in selected {
        for (s, species) in result.species_ids(c).iter().enumerate() {
            let stats: Vec<_> = (0..result.len())
                .map(|t| result.avg_min_max(t, c, s).unwrap_or_default())
                .collect();
            curves.push(Curve {
                label: format!("{}/{}", ids[c], species),
                colour: result.species_colour(c, s),
                avg: stats.iter().map(|m| m.avg).collect(),
                min: stats.iter().map(|m| m.min).collect(),
                max: stats.iter().map(|m| m.max).collect(),
            });
        }
    }
    curves
}

/// Plot the average concentration of every species against time
///
/// `compartment` restricts the plot to one compartment; `None` draws all.
/// The backend follows the extension of `output_path`: `.svg` gives a
/// vector image, anything else a bitmap.
///
/// # Errors
///
/// Returns `Err` if the result holds no time points, the selection holds no
/// species, or the backend cannot write to `output_path`.
pub fn plot_time_series(
    result: &SimulationResult,
    compartment: Option<usize>,
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    if result.is_empty() {
        return Err("Simulation result has no time points".into());
    }
    let curves = extract_curves(result, compartment);
    if curves.is_empty() {
        return Err("No species to plot in the selected compartments".into());
    }

    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);
    config.validate()?;

    let time_points = result.time_points();
    let max_time = time_points.last().copied().filter(|t| *t > 0.0).unwrap_or(1.0);
    let (lo, hi) = curves
        .iter()
        .flat_map(|c| c.min.iter().chain(&c.max))
        .fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let hi = hi.max(lo + 1e-10);

    let ext = std::path::Path::new(output_path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("png");

    match ext {
        "svg" => {
            let backend = SVGBackend::new(output_path, (config.width, config.height));
            plot_time_series_impl(backend, time_points, &curves, config, max_time, (lo, hi))
        }
        _ => {
            let backend = BitMapBackend::new(output_path, (config.width, config.height));
            plot_time_series_impl(backend, time_points, &curves, config, max_time, (lo, hi))
        }
    }
}

fn plot_time_series_impl<DB: DrawingBackend>(
    backend: DB,
    time_points: &[f64],
    curves: &[Curve],
    config: &PlotConfig,
    max_time: f64,
    (lo, hi): (f64, f64),
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 40).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..max_time, lo..(hi * 1.1))?;

    if config.show_grid {
        chart
            .configure_mesh()
            .x_desc(&config.xlabel)
            .y_desc(&config.ylabel)
            .x_label_formatter(&|x| format!("{:.2}", x))
            .y_label_formatter(&|y| format!("{:.3}", y))
            .draw()?;
    }

    for (k, curve) in curves.iter().enumerate() {
        let color = config.species_color(k, curve.colour);

        if config.show_range {
            for bound in [&curve.min, &curve.max] {
                chart.draw_series(LineSeries::new(
                    time_points.iter().zip(bound).map(|(t, c)| (*t, *c)),
                    ShapeStyle::from(&color.mix(0.3)).stroke_width(1),
                ))?;
            }
        }

        chart
            .draw_series(LineSeries::new(
                time_points.iter().zip(&curve.avg).map(|(t, c)| (*t, *c)),
                ShapeStyle::from(&color).stroke_width(config.line_width),
            ))?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

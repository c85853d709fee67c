//! `pixsim`: run a built-in model and write its results

mod cli;

use std::error::Error;

use cli::Cli;
use pixsim_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter};
use pixsim_rs::output::visualization::{plot_time_series, save_concentration_image, PlotConfig};
use pixsim_rs::solver::{set_parallel_threshold, Simulation, SimulatorType};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::from_args();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    cli.validate_parameters()?;

    // ====== Step 1: Model ======
    let (model, geometry) = cli.load_model()?;

    // ====== Step 2: Simulation ======
    let mut sim = Simulation::new(&model, geometry, SimulatorType::Pixel, cli.backend.into())?;
    sim.set_integrator_options(cli.integrator_options())?;
    sim.set_max_threads(cli.threads);
    if let Some(threshold) = cli.parallel_threshold {
        set_parallel_threshold(threshold);
    }
    if let Some(message) = sim.error_message() {
        return Err(message.into());
    }

    // ====== Step 3: Run ======
    let interval = cli.interval();
    let start = std::time::Instant::now();
    let mut total_steps = 0;
    for _ in 0..cli.snapshots {
        let steps = sim.advance(interval);
        if let Some(message) = sim.error_message() {
            return Err(format!("simulation stopped: {}", message).into());
        }
        total_steps += steps;
        log::debug!("t = {:.6}: {} sub-steps", sim.time_points().last().copied().unwrap_or(0.0), steps);
    }
    log::info!(
        "'{}' reached t = {} in {} sub-steps ({:.3} s)",
        model.name,
        cli.time,
        total_steps,
        start.elapsed().as_secs_f64()
    );

    let last = sim.time_points().len() - 1;
    for (c, compartment) in sim.compartment_ids().iter().enumerate() {
        for (s, species) in sim.species_ids(c).iter().enumerate() {
            if let Some(stats) = sim.avg_min_max(last, c, s) {
                println!(
                    "{:>12} {:>12}  avg {:.6e}  min {:.6e}  max {:.6e}",
                    compartment, species, stats.avg, stats.min, stats.max
                );
            }
        }
    }

    // ====== Step 4: Output ======
    if let Some(path) = &cli.csv {
        let mut metadata = CsvMetadata::from_result(sim.result());
        metadata.add_custom("Integrator order", &cli.order.to_string());
        metadata.add_custom("Threads", &sim.max_threads().to_string());
        CsvExporter::new(CsvConfig::default().with_metadata(metadata)).export(sim.result(), None, path)?;
        log::info!("statistics written to {}", path);
    }
    if let Some(path) = &cli.plot {
        let config = PlotConfig::time_series(model.name.as_str());
        plot_time_series(sim.result(), None, path, Some(&config))?;
        log::info!("plot written to {}", path);
    }
    if let Some(path) = &cli.image {
        save_concentration_image(sim.result(), last, 0, cli.image_scale, path)?;
        log::info!("image written to {}", path);
    }

    Ok(())
}

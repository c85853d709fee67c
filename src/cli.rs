use clap::Parser;
use clap::ValueEnum;

use pixsim_rs::error::ModelError;
use pixsim_rs::geometry::Geometry;
use pixsim_rs::models::ModelDef;
use pixsim_rs::models::library;
use pixsim_rs::physics::MathBackend;
use pixsim_rs::solver::{IntegratorOptions, MinStepPolicy};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Reaction-diffusion simulation of built-in models on pixel geometries"
)]
pub struct Cli {
    // Model settings
    #[arg(long, value_enum, default_value = "very-simple")]
    pub model: DemoModel,
    /// Grid edge length of the diffusion models
    #[arg(long, default_value = "32")]
    pub size: usize,

    // Run settings
    /// Total simulated time
    #[arg(long, default_value = "10.0")]
    pub time: f64,
    /// Number of equally spaced snapshots after time zero
    #[arg(long, default_value = "10")]
    pub snapshots: usize,
    /// Worker threads, 0 for the runtime default
    #[arg(long, default_value = "0")]
    pub threads: usize,
    /// State length above which stage combinations run in parallel
    #[arg(long)]
    pub parallel_threshold: Option<usize>,
    #[arg(long, value_enum, default_value = "interpreted")]
    pub backend: Backend,
    #[arg(long)]
    pub verbose: bool,

    // Integrator settings
    /// Runge-Kutta order (1-4)
    #[arg(long, default_value = "2")]
    pub order: usize,
    #[arg(long, default_value = "0.005")]
    pub max_rel_err: f64,
    #[arg(long, default_value_t = f64::MAX)]
    pub max_abs_err: f64,
    #[arg(long, default_value_t = f64::MAX)]
    pub max_timestep: f64,
    #[arg(long, default_value = "1e-12")]
    pub min_timestep: f64,
    #[arg(long, value_enum, default_value = "fail")]
    pub min_step_policy: StepPolicy,

    // Output settings
    /// CSV file of per-species statistics
    #[arg(long)]
    pub csv: Option<String>,
    /// Plot of the species averages (.png or .svg)
    #[arg(long)]
    pub plot: Option<String>,
    /// Preview image of the final state, layer 0
    #[arg(long)]
    pub image: Option<String>,
    /// Screen pixels per voxel in the preview image
    #[arg(long, default_value = "8")]
    pub image_scale: u32,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn validate_parameters(&self) -> Result<(), String> {
        if !(self.time > 0.0) || !self.time.is_finite() {
            return Err(format!("Simulated time must be positive and finite, got {}", self.time));
        }
        if self.snapshots == 0 {
            return Err("At least one snapshot is required".to_string());
        }
        if self.size < 3 {
            return Err(format!("Grid size must be at least 3, got {}", self.size));
        }
        if self.image_scale == 0 {
            return Err("Image scale must be positive".to_string());
        }
        self.integrator_options().validate()
    }

    pub fn integrator_options(&self) -> IntegratorOptions {
        IntegratorOptions {
            order: self.order,
            max_rel_err: self.max_rel_err,
            max_abs_err: self.max_abs_err,
            max_timestep: self.max_timestep,
            min_timestep: self.min_timestep,
            min_step_policy: self.min_step_policy.into(),
        }
    }

    /// Simulated time between snapshots
    pub fn interval(&self) -> f64 {
        self.time / self.snapshots as f64
    }

    pub fn load_model(&self) -> Result<(ModelDef, Geometry), ModelError> {
        match self.model {
            DemoModel::VerySimple => library::very_simple_model(),
            DemoModel::Brusselator => library::brusselator(),
            DemoModel::Diffusion => library::diffusion_spot(self.size),
            DemoModel::Diffusion3d => library::diffusion_cube(self.size),
        }
    }
}

#[derive(Parser, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoModel {
    VerySimple,
    Brusselator,
    Diffusion,
    Diffusion3d,
}

#[derive(Parser, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Interpreted,
    Compiled,
    Symbolic,
}

impl From<Backend> for MathBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Interpreted => MathBackend::Interpreted,
            Backend::Compiled => MathBackend::Compiled,
            Backend::Symbolic => MathBackend::Symbolic,
        }
    }
}

#[derive(Parser, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StepPolicy {
    Fail,
    AcceptAndWarn,
}

impl From<StepPolicy> for MinStepPolicy {
    fn from(policy: StepPolicy) -> Self {
        match policy {
            StepPolicy::Fail => MinStepPolicy::Fail,
            StepPolicy::AcceptAndWarn => MinStepPolicy::AcceptAndWarn,
        }
    }
}

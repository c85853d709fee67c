//! Figure settings for the time-series plots

use plotters::prelude::*;

/// Size, labels and colours of a species time-series figure
///
/// ```rust
/// use pixsim_rs::output::visualization::PlotConfig;
///
/// let config = PlotConfig {
///     width: 1920,
///     height: 1080,
///     show_range: true,
///     ..PlotConfig::time_series("Brusselator")
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,

    /// Curve colours by species position; species past the end use their
    /// display colour
    pub species_colors: Option<Vec<RGBColor>>,

    pub background: RGBColor,
    pub line_width: u32,
    pub show_grid: bool,

    /// Also draw the per-time minimum and maximum over the pixels
    pub show_range: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Concentrations".to_string(),
            xlabel: "Time".to_string(),
            ylabel: "Concentration".to_string(),
            species_colors: None,
            background: WHITE,
            line_width: 2,
            show_grid: true,
            show_range: false,
        }
    }
}

impl PlotConfig {
    /// Default figure titled `title`
    pub fn time_series(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width < 64 || self.height < 64 {
            return Err(format!(
                "Plot size {}x{} is too small (minimum 64x64)",
                self.width, self.height
            ));
        }
        if self.line_width == 0 {
            return Err("Line width must be positive".to_string());
        }
        Ok(())
    }

    /// Color of curve `index`, or `fallback` (the species display colour)
    ///
    /// Custom colors win; without either the default palette is used.
    pub(crate) fn species_color(&self, index: usize, fallback: Option<[u8; 3]>) -> RGBColor {
        if let Some(colors) = &self.species_colors
            && let Some(color) = colors.get(index)
        {
            return *color;
        }
        if let Some([r, g, b]) = fallback {
            return RGBColor(r, g, b);
        }

        const PALETTE: [RGBColor; 10] = [
            RED,
            BLUE,
            GREEN,
            MAGENTA,
            CYAN,
            BLACK,
            RGBColor(255, 165, 0),
            RGBColor(128, 0, 128),
            RGBColor(255, 192, 203),
            RGBColor(165, 42, 42),
        ];
        PALETTE[index % PALETTE.len()]
    }
}

// =================================================================================================
// Tests
// =================================================================================================

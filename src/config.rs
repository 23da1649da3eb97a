use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Fixed analysis constants
// ---------------------------------------------------------------------------

/// Plots with a mean height at or above this value are treated as outliers.
pub const MAX_HEIGHT: f64 = 7000.0;

/// Plots with a mean diameter at or above this value are treated as outliers.
pub const MAX_DIAMETER: f64 = 120.0;

/// p-value below which a model term is reported as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Initial centre of the interactive map, `[longitude, latitude]`.
pub const MAP_CENTER: [f64; 2] = [-120.5, 43.5];

/// Initial web-map zoom level of the interactive map.
pub const MAP_ZOOM: u32 = 6;

/// Default location of the plot shapefile, relative to the working directory.
pub const DEFAULT_INPUT: &str = "data/oregon_plots.shp";

/// Directory receiving the rendered charts and summaries.
pub const DEFAULT_OUTPUT_DIR: &str = "report";

// ---------------------------------------------------------------------------
// Outlier thresholds
// ---------------------------------------------------------------------------

/// Cut-offs for the outlier filter. Chosen by eye from the scatter matrix,
/// kept exact so the analysis stays reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub max_height: f64,
    pub max_diameter: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_height: MAX_HEIGHT,
            max_diameter: MAX_DIAMETER,
        }
    }
}

// ---------------------------------------------------------------------------
// Report configuration
// ---------------------------------------------------------------------------

/// Everything a report run needs to know up front.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    /// Plot dataset (`.shp`, `.csv`, `.geojson` or `.parquet`).
    pub input: PathBuf,
    /// Optional polygon shapefile replacing the built-in Oregon outline.
    pub boundary: Option<PathBuf>,
    /// Where charts and summaries are written.
    pub output_dir: PathBuf,
    /// Year used for the single-year views. `None` picks the latest year.
    pub focus_year: Option<i64>,
    pub thresholds: Thresholds,
    pub significance_level: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            boundary: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            focus_year: None,
            thresholds: Thresholds::default(),
            significance_level: SIGNIFICANCE_LEVEL,
        }
    }
}

/// Degrees of longitude covered by `width_px` screen pixels at a web-map
/// zoom level (256 px tiles spanning 360° at zoom 0).
pub fn degrees_for_pixels(width_px: f64, zoom: u32) -> f64 {
    width_px / 256.0 * 360.0 / 2f64.powi(zoom as i32)
}

use anyhow::{Result, bail};

use super::model::{CellValue, PlotRow};

// ---------------------------------------------------------------------------
// Attribute names in the source file
// ---------------------------------------------------------------------------

pub const PLOT_ID: &str = "PLT_CN";
pub const YEAR: &str = "INVYR";
pub const BIOMASS: &str = "BIO_ACRE";
pub const DIAMETER: &str = "DIA";
pub const HEIGHT: &str = "HT";
pub const ELEVATION: &str = "ELEV";
pub const TREE_COUNT: &str = "CNT";
pub const BURNED: &str = "BURNED";

/// Coordinate columns for tabular sources without a geometry.
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";

/// Attribute columns every source must carry.
pub const REQUIRED: [&str; 8] = [
    PLOT_ID, YEAR, BIOMASS, DIAMETER, HEIGHT, ELEVATION, TREE_COUNT, BURNED,
];

// ---------------------------------------------------------------------------
// Resolved schema
// ---------------------------------------------------------------------------

/// Positions of the required attributes within a source's column list.
///
/// Matching is case-insensitive so `ht`, `Ht` and `HT` all resolve; a
/// missing column fails the load instead of silently shifting fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub plot_id: usize,
    pub year: usize,
    pub biomass: usize,
    pub diameter: usize,
    pub height: usize,
    pub elevation: usize,
    pub tree_count: usize,
    pub burned: usize,
}

impl Schema {
    /// Resolve the required attributes against the given column names.
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| find(columns, name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("Missing required column(s): {}", missing.join(", "));
        }

        let idx = |name: &str| find(columns, name).unwrap_or_default();
        Ok(Schema {
            plot_id: idx(PLOT_ID),
            year: idx(YEAR),
            biomass: idx(BIOMASS),
            diameter: idx(DIAMETER),
            height: idx(HEIGHT),
            elevation: idx(ELEVATION),
            tree_count: idx(TREE_COUNT),
            burned: idx(BURNED),
        })
    }

    /// Build a row from cells laid out in the resolved column order.
    /// Coordinates are supplied separately since they come from geometry
    /// or dedicated columns depending on the source.
    pub fn row(&self, cells: &[CellValue], longitude: Option<f64>, latitude: Option<f64>) -> PlotRow {
        let cell = |i: usize| cells.get(i).unwrap_or(&CellValue::Null);
        PlotRow {
            plot_id: cell(self.plot_id).as_id(),
            year: cell(self.year).as_i64(),
            biomass: cell(self.biomass).as_f64(),
            diameter: cell(self.diameter).as_f64(),
            height: cell(self.height).as_f64(),
            elevation: cell(self.elevation).as_f64(),
            tree_count: cell(self.tree_count).as_i64(),
            burned: cell(self.burned).as_flag(),
            longitude,
            latitude,
        }
    }
}

/// Case-insensitive column lookup.
pub fn find<S: AsRef<str>>(columns: &[S], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.as_ref().trim().eq_ignore_ascii_case(name))
}

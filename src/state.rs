use std::collections::BTreeSet;

use crate::color::{DivergingScale, ResidualBins};
use crate::config::{degrees_for_pixels, MAP_CENTER, MAP_ZOOM};
use crate::data::filter::distinct_years;
use crate::geo::Region;
use crate::render::ResidualPoint;
use crate::report::Report;

/// Legend bins on the interactive map.
const LEGEND_BINS: usize = 8;

// ---------------------------------------------------------------------------
// Interactive map state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct MapState {
    /// Residuals of the all-years fit, one per plot.
    pub points: Vec<ResidualPoint>,

    /// Colour bins shared by markers and legend.
    pub bins: ResidualBins,

    pub region: Region,

    /// Sample years present, ascending.
    pub years: Vec<i64>,

    /// Years currently shown.
    pub visible_years: BTreeSet<i64>,

    /// Indices of points passing the year filter (cached).
    pub visible_indices: Vec<usize>,

    /// Model summaries shown in the side panel.
    pub summary_text: String,

    /// Set until the fixed initial viewport has been applied.
    pub viewport_pending: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl MapState {
    pub fn new(points: Vec<ResidualPoint>, region: Region, summary_text: String) -> Self {
        let residuals: Vec<f64> = points.iter().map(|p| p.residual).collect();
        let bins = ResidualBins::new(DivergingScale::symmetric(&residuals), LEGEND_BINS);

        let years = distinct_years(points.iter().map(|p| p.year));

        let status_message = points
            .is_empty()
            .then(|| "No residuals to show: the all-years regression was not fitted.".to_string());

        let mut state = Self {
            visible_years: years.iter().copied().collect(),
            visible_indices: Vec::new(),
            points,
            bins,
            region,
            years,
            summary_text,
            viewport_pending: true,
            status_message,
        };
        state.refilter();
        state
    }

    pub fn from_report(report: &Report) -> Self {
        Self::new(
            report.residuals_all.clone(),
            report.region.clone(),
            report.summary_text.clone(),
        )
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| self.visible_years.contains(&p.year) && p.residual.is_finite())
            .map(|(i, _)| i)
            .collect();
    }

    /// Toggle a single year.
    pub fn toggle_year(&mut self, year: i64) {
        if !self.visible_years.remove(&year) {
            self.visible_years.insert(year);
        }
        self.refilter();
    }

    pub fn select_all(&mut self) {
        self.visible_years = self.years.iter().copied().collect();
        self.refilter();
    }

    pub fn select_none(&mut self) {
        self.visible_years.clear();
        self.refilter();
    }

    /// Visible points grouped by legend bin: `(label, colour, [lon, lat]s)`.
    pub fn binned_points(&self) -> Vec<(String, crate::color::Rgb8, Vec<[f64; 2]>)> {
        let mut groups: Vec<Vec<[f64; 2]>> = vec![Vec::new(); self.bins.len()];
        for &i in &self.visible_indices {
            let p = &self.points[i];
            groups[self.bins.bin_of(p.residual)].push([p.longitude, p.latitude]);
        }
        groups
            .into_iter()
            .enumerate()
            .filter(|(_, pts)| !pts.is_empty())
            .map(|(b, pts)| (self.bins.label(b), self.bins.color(b), pts))
            .collect()
    }

    /// Request the fixed initial viewport again.
    pub fn reset_view(&mut self) {
        self.viewport_pending = true;
    }
}

/// Plot bounds `(min, max)` of the initial viewport for a plot area of
/// `width_px` × `height_px`, centred on the configured map centre.
/// Latitude span is shrunk by cos(latitude) so degrees look square.
pub fn initial_bounds(width_px: f64, height_px: f64) -> ([f64; 2], [f64; 2]) {
    let lon_span = degrees_for_pixels(width_px, MAP_ZOOM);
    let lat_span = degrees_for_pixels(height_px, MAP_ZOOM) * MAP_CENTER[1].to_radians().cos();
    (
        [MAP_CENTER[0] - lon_span / 2.0, MAP_CENTER[1] - lat_span / 2.0],
        [MAP_CENTER[0] + lon_span / 2.0, MAP_CENTER[1] + lat_span / 2.0],
    )
}

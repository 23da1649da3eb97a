//! Static report charts, written as SVG with plotters.
//!
//! The SVG backend draws text as `<text>` elements, so no font files are
//! needed at build or run time.

pub mod boxplot;
pub mod corrplot;
pub mod map;
pub mod scatter;

use std::path::Path;

use anyhow::{Context, Result};
use plotters::style::RGBColor;

use crate::color::Rgb8;

pub use boxplot::render_group_boxplots;
pub use corrplot::render_correlation;
pub use map::{render_locations, render_residual_map, ResidualPoint};
pub use scatter::render_scatter_matrix;

pub(crate) const FONT: &str = "sans-serif";

pub(crate) fn rgb(c: Rgb8) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

/// Create the parent directory of `path` if needed.
pub(crate) fn prepare_output(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    Ok(())
}

/// `(min, max)` over finite values, widened when the span is zero and
/// padded by `pad` of the span on each side. Falls back to `(0, 1)`.
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if max - min == 0.0 {
        return (min - 1.0, max + 1.0);
    }
    let d = (max - min) * pad;
    (min - d, max + d)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Fresh scratch directory under the system temp dir.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("forest_eda_{}_{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Read an SVG back and check it looks like one.
    pub fn read_svg(path: &std::path::Path) -> String {
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("<svg"), "{} is not an SVG", path.display());
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_degenerate_input() {
        assert_eq!(padded_range([f64::NAN], 0.1), (0.0, 1.0));
        assert_eq!(padded_range([3.0, 3.0], 0.1), (2.0, 4.0));
        let (lo, hi) = padded_range([0.0, 10.0], 0.1);
        assert!((lo + 1.0).abs() < 1e-12 && (hi - 11.0).abs() < 1e-12);
    }
}

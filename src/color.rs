use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

/// 8-bit sRGB colour shared by the SVG renderer and the interactive map.
pub type Rgb8 = Srgb<u8>;

/// Convert for egui.
pub fn to_color32(c: Rgb8) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging scale: residual → colour
// ---------------------------------------------------------------------------

const NEGATIVE: (f32, f32, f32) = (0.129, 0.400, 0.675);
const NEUTRAL: (f32, f32, f32) = (0.969, 0.969, 0.969);
const POSITIVE: (f32, f32, f32) = (0.698, 0.094, 0.169);

/// Blue → white → red scale centred at zero and symmetric around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergingScale {
    /// Absolute value mapped to the saturated ends.
    pub limit: f64,
}

impl DivergingScale {
    /// Scale reaching its ends at the largest absolute finite value.
    pub fn symmetric(values: &[f64]) -> Self {
        let limit = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        DivergingScale {
            limit: if limit > 0.0 { limit } else { 1.0 },
        }
    }

    /// Position on the scale in [-1, 1].
    pub fn position(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        (value / self.limit).clamp(-1.0, 1.0)
    }

    pub fn color_for(&self, value: f64) -> Rgb8 {
        let t = self.position(value);
        let neutral = lin(NEUTRAL);
        let end = if t < 0.0 { lin(NEGATIVE) } else { lin(POSITIVE) };
        let mixed = neutral.mix(end, t.abs() as f32);
        Srgb::<u8>::from_linear(mixed)
    }
}

fn lin((r, g, b): (f32, f32, f32)) -> LinSrgb {
    Srgb::new(r, g, b).into_linear()
}

// ---------------------------------------------------------------------------
// Legend bins
// ---------------------------------------------------------------------------

/// Equal-width bins over `[-limit, limit]` for legend entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualBins {
    pub scale: DivergingScale,
    pub edges: Vec<f64>,
}

impl ResidualBins {
    pub fn new(scale: DivergingScale, count: usize) -> Self {
        let count = count.max(1);
        let step = 2.0 * scale.limit / count as f64;
        let edges = (0..=count).map(|i| -scale.limit + step * i as f64).collect();
        ResidualBins { scale, edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin index for a value; values beyond the ends land in the end bins.
    pub fn bin_of(&self, value: f64) -> usize {
        let last = self.len() - 1;
        self.edges[1..self.len()]
            .iter()
            .position(|&edge| value < edge)
            .unwrap_or(last)
    }

    pub fn label(&self, bin: usize) -> String {
        let decimals = if self.scale.limit >= 10.0 { 0 } else { 2 };
        format!(
            "{:.*} to {:.*}",
            decimals,
            self.edges[bin],
            decimals,
            self.edges[bin + 1]
        )
    }

    /// Colour at the bin's midpoint.
    pub fn color(&self, bin: usize) -> Rgb8 {
        self.scale
            .color_for((self.edges[bin] + self.edges[bin + 1]) / 2.0)
    }

    /// Legend entries (label → colour), lowest bin first.
    pub fn legend_entries(&self) -> Vec<(String, Rgb8)> {
        (0..self.len()).map(|b| (self.label(b), self.color(b))).collect()
    }
}

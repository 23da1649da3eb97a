use std::path::Path;

use anyhow::{Context, Result, bail};
use shapefile::Shape;

/// Simplified Oregon state boundary, `[longitude, latitude]`, closed ring.
const OREGON_OUTLINE: [[f64; 2]; 31] = [
    [-124.21, 42.00],
    [-122.28, 42.00],
    [-120.00, 42.00],
    [-117.03, 42.00],
    [-117.03, 43.83],
    [-116.93, 44.10],
    [-117.22, 44.30],
    [-117.19, 44.43],
    [-116.89, 44.84],
    [-116.70, 45.02],
    [-116.46, 45.57],
    [-116.69, 45.81],
    [-116.92, 46.00],
    [-118.99, 46.00],
    [-119.34, 45.94],
    [-119.87, 45.84],
    [-120.50, 45.70],
    [-121.19, 45.61],
    [-121.78, 45.69],
    [-122.25, 45.55],
    [-122.76, 45.65],
    [-122.86, 46.05],
    [-123.22, 46.17],
    [-123.55, 46.26],
    [-123.95, 46.24],
    [-123.97, 45.50],
    [-124.08, 44.60],
    [-124.15, 43.70],
    [-124.41, 43.00],
    [-124.55, 42.84],
    [-124.21, 42.00],
];

/// Longitude / latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 2]>) -> Option<Self> {
        let mut it = points.into_iter().filter(|p| p[0].is_finite() && p[1].is_finite());
        let first = it.next()?;
        let mut b = Bounds {
            min: *first,
            max: *first,
        };
        for p in it {
            b.include(*p);
        }
        Some(b)
    }

    pub fn include(&mut self, p: [f64; 2]) {
        if !(p[0].is_finite() && p[1].is_finite()) {
            return;
        }
        self.min = [self.min[0].min(p[0]), self.min[1].min(p[1])];
        self.max = [self.max[0].max(p[0]), self.max[1].max(p[1])];
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    /// Grow every side by `fraction` of the span.
    pub fn padded(&self, fraction: f64) -> Self {
        let dx = ((self.max[0] - self.min[0]) * fraction).max(1e-6);
        let dy = ((self.max[1] - self.min[1]) * fraction).max(1e-6);
        Bounds {
            min: [self.min[0] - dx, self.min[1] - dy],
            max: [self.max[0] + dx, self.max[1] + dy],
        }
    }
}

/// A named region outline made of one or more rings.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl Region {
    /// Built-in Oregon outline.
    pub fn oregon() -> Self {
        Region {
            name: "Oregon".to_string(),
            rings: vec![OREGON_OUTLINE.to_vec()],
        }
    }

    /// Read every polygon ring from a polygon shapefile.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        let shapes = shapefile::read_shapes(path)
            .with_context(|| format!("reading boundary {}", path.display()))?;

        let mut rings = Vec::new();
        for shape in shapes {
            if let Shape::Polygon(polygon) = shape {
                for ring in polygon.rings() {
                    rings.push(ring.points().iter().map(|p| [p.x, p.y]).collect());
                }
            }
        }
        if rings.is_empty() {
            bail!("{} contains no polygon rings", path.display());
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("region")
            .to_string();
        log::info!("Loaded boundary '{name}' with {} ring(s)", rings.len());
        Ok(Region { name, rings })
    }

    /// Boundary from `path` when given, otherwise the built-in outline.
    /// An unreadable boundary falls back to the built-in one.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Region::from_shapefile(p).unwrap_or_else(|e| {
                log::error!("Falling back to built-in outline: {e:#}");
                Region::oregon()
            }),
            None => Region::oregon(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.rings.iter().flatten())
    }
}

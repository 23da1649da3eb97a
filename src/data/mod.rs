/// Data layer: core types, loading, and cleaning.
///
/// Architecture:
/// ```text
///  .shp / .csv / .geojson / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file + schema → PlotTable (nullable rows)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop nulls → drop outliers → Vec<PlotRecord>
///   └──────────┘
///        │
///        ▼
///   subset_year / columns  → explorer, models, maps
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;

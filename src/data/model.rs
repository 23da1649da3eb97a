use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single attribute cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value, covering what shapefile (dBase),
/// CSV, GeoJSON and Parquet sources can hand us.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view. NaN, infinities and unparsable text count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v).filter(|v| v.is_finite()),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Null => None,
        }
    }

    /// Integer view; floats are accepted only when they hold a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            CellValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// 0/1 flag view. Anything other than 0 or 1 is missing.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            other => match other.as_i64()? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
        }
    }

    /// Identifier view: text as-is, numbers formatted without decoration.
    pub fn as_id(&self) -> Option<String> {
        match self {
            CellValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(v) if v.is_finite() => Some(format!("{v}")),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Variable – named numeric columns
// ---------------------------------------------------------------------------

/// Numeric columns of the plot table, selected by name rather than position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Variable {
    Year,
    Biomass,
    Diameter,
    Height,
    Elevation,
    TreeCount,
    Burned,
}

impl Variable {
    /// Every numeric attribute column, in table order.
    pub const ALL: [Variable; 7] = [
        Variable::Year,
        Variable::Biomass,
        Variable::Diameter,
        Variable::Height,
        Variable::Elevation,
        Variable::TreeCount,
        Variable::Burned,
    ];

    /// Columns relevant to the burn / elevation / height questions.
    pub const RELEVANT: [Variable; 5] = [
        Variable::Biomass,
        Variable::Diameter,
        Variable::Height,
        Variable::Elevation,
        Variable::Burned,
    ];

    /// Columns compared across burned / unburned plots.
    pub const MEASURED: [Variable; 5] = [
        Variable::Biomass,
        Variable::Diameter,
        Variable::Height,
        Variable::Elevation,
        Variable::TreeCount,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Variable::Year => "year",
            Variable::Biomass => "biomass",
            Variable::Diameter => "diameter",
            Variable::Height => "height",
            Variable::Elevation => "elevation",
            Variable::TreeCount => "tree_count",
            Variable::Burned => "burned",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PlotRow – one loaded observation, everything nullable
// ---------------------------------------------------------------------------

/// One sampled inventory plot as read from the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotRow {
    pub plot_id: Option<String>,
    pub year: Option<i64>,
    pub biomass: Option<f64>,
    pub diameter: Option<f64>,
    pub height: Option<f64>,
    pub elevation: Option<f64>,
    pub tree_count: Option<i64>,
    pub burned: Option<bool>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl PlotRow {
    /// The fully-populated record, or `None` if any tracked field is null.
    pub fn to_record(&self) -> Option<PlotRecord> {
        Some(PlotRecord {
            plot_id: self.plot_id.clone()?,
            year: self.year?,
            biomass: self.biomass?,
            diameter: self.diameter?,
            height: self.height?,
            elevation: self.elevation?,
            tree_count: self.tree_count?,
            burned: self.burned?,
            longitude: self.longitude?,
            latitude: self.latitude?,
        })
    }
}

// ---------------------------------------------------------------------------
// PlotRecord – a complete observation
// ---------------------------------------------------------------------------

/// A plot with every field present. Only the cleaner builds these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotRecord {
    pub plot_id: String,
    pub year: i64,
    pub biomass: f64,
    pub diameter: f64,
    pub height: f64,
    pub elevation: f64,
    pub tree_count: i64,
    pub burned: bool,
    pub longitude: f64,
    pub latitude: f64,
}

impl PlotRecord {
    pub fn value(&self, var: Variable) -> f64 {
        match var {
            Variable::Year => self.year as f64,
            Variable::Biomass => self.biomass,
            Variable::Diameter => self.diameter,
            Variable::Height => self.height,
            Variable::Elevation => self.elevation,
            Variable::TreeCount => self.tree_count as f64,
            Variable::Burned => {
                if self.burned {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PlotTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded dataset, rows in file order.
#[derive(Debug, Clone, Default)]
pub struct PlotTable {
    /// File the rows came from, for log and report lines.
    pub source: String,
    pub rows: Vec<PlotRow>,
}

impl PlotTable {
    pub fn new(source: impl Into<String>, rows: Vec<PlotRow>) -> Self {
        PlotTable {
            source: source.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NumericColumn – explorer input
// ---------------------------------------------------------------------------

/// A named numeric column with possible gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub variable: Variable,
    pub values: Vec<Option<f64>>,
}

/// Project the named columns of a cleaned record set. Every value is
/// present; the correlation code still accepts gaps for other inputs.
pub fn record_columns(records: &[PlotRecord], vars: &[Variable]) -> Vec<NumericColumn> {
    vars.iter()
        .map(|&var| NumericColumn {
            variable: var,
            values: records.iter().map(|r| Some(r.value(var))).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row() -> PlotRow {
        PlotRow {
            plot_id: Some("p1".into()),
            year: Some(2011),
            biomass: Some(40.0),
            diameter: Some(12.0),
            height: Some(60.0),
            elevation: Some(900.0),
            tree_count: Some(14),
            burned: Some(false),
            longitude: Some(-121.0),
            latitude: Some(44.0),
        }
    }

    #[test]
    fn to_record_requires_every_field() {
        assert!(full_row().to_record().is_some());
        let mut row = full_row();
        row.latitude = None;
        assert!(row.to_record().is_none());
        let mut row = full_row();
        row.burned = None;
        assert!(row.to_record().is_none());
    }

    #[test]
    fn cell_value_conversions() {
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Float(f64::INFINITY).as_f64(), None);
        assert_eq!(CellValue::String("-inf".into()).as_f64(), None);
        assert_eq!(CellValue::String(" 3.5 ".into()).as_f64(), Some(3.5));
        assert_eq!(CellValue::Float(2012.0).as_i64(), Some(2012));
        assert_eq!(CellValue::Float(2012.5).as_i64(), None);
        assert_eq!(CellValue::Integer(1).as_flag(), Some(true));
        assert_eq!(CellValue::Integer(2).as_flag(), None);
        assert_eq!(CellValue::Integer(77).as_id().as_deref(), Some("77"));
    }

    #[test]
    fn record_columns_follow_record_order() {
        let mut second = full_row();
        second.height = Some(75.0);
        second.burned = Some(true);
        let records: Vec<PlotRecord> = [full_row(), second].iter().filter_map(PlotRow::to_record).collect();
        let cols = record_columns(&records, &[Variable::Height, Variable::Burned]);
        assert_eq!(cols[0].variable, Variable::Height);
        assert_eq!(cols[0].values, vec![Some(60.0), Some(75.0)]);
        assert_eq!(cols[1].values, vec![Some(0.0), Some(1.0)]);
    }
}

use serde::Serialize;

use crate::data::model::{NumericColumn, Variable};

/// Pearson correlation matrix, each cell computed over the rows where both
/// columns are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<Variable>,
    /// Row-major, `variables.len()` squared. NaN where a column is constant
    /// over the shared rows or fewer than two rows are shared.
    pub values: Vec<Vec<f64>>,
    /// Number of complete pairs behind each cell.
    pub pairs: Vec<Vec<usize>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.variables.iter().position(|&v| v == a)?;
        let j = self.variables.iter().position(|&v| v == b)?;
        Some(self.values[i][j])
    }
}

/// Correlate every pair of columns using pairwise-complete observations.
pub fn correlation_matrix(columns: &[NumericColumn]) -> CorrelationMatrix {
    let k = columns.len();
    let mut values = vec![vec![f64::NAN; k]; k];
    let mut pairs = vec![vec![0usize; k]; k];

    for i in 0..k {
        for j in i..k {
            let (r, n) = pearson_pairwise(&columns[i].values, &columns[j].values);
            let r = if i == j { 1.0 } else { r };
            values[i][j] = r;
            values[j][i] = r;
            pairs[i][j] = n;
            pairs[j][i] = n;
        }
    }

    CorrelationMatrix {
        variables: columns.iter().map(|c| c.variable).collect(),
        values,
        pairs,
    }
}

/// Pearson r over rows where both sides are present, and the pair count.
pub fn pearson_pairwise(x: &[Option<f64>], y: &[Option<f64>]) -> (f64, usize) {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();

    let n = pairs.len();
    if n < 2 {
        return (f64::NAN, n);
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return (f64::NAN, n);
    }
    ((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0), n)
}

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use super::{f_upper_tail, ModelError, ModelResult};

/// One line of an ANOVA table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnovaRow {
    pub df: f64,
    pub sum_sq: f64,
    pub mean_sq: f64,
}

/// Per-level counts and means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub level: String,
    pub n: usize,
    pub mean: f64,
}

/// One-way ANOVA of a numeric response across the levels of a factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaTable {
    pub factor_name: String,
    pub response_name: String,
    pub factor: AnovaRow,
    pub residuals: AnovaRow,
    pub f_value: f64,
    pub p_value: f64,
    pub groups: Vec<GroupSummary>,
}

impl AnovaTable {
    /// Reject "no association" when p is below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Fit `response ~ factor`.
///
/// Fails when the factor has fewer than two distinct levels, the slices
/// differ in length, or no residual degrees of freedom remain.
pub fn one_way_anova<K>(
    factor_name: &str,
    factor: &[K],
    response_name: &str,
    response: &[f64],
) -> ModelResult<AnovaTable>
where
    K: Ord + Clone + Display,
{
    if factor.len() != response.len() {
        return Err(ModelError::LengthMismatch {
            predictor: factor.len(),
            response: response.len(),
        });
    }

    let mut levels: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (k, &y) in factor.iter().zip(response) {
        let entry = levels.entry(k.clone()).or_insert((0.0, 0));
        entry.0 += y;
        entry.1 += 1;
    }
    if levels.len() < 2 {
        return Err(ModelError::SingleLevel {
            levels: levels.len(),
        });
    }

    let n = response.len();
    let k = levels.len();
    if n <= k {
        return Err(ModelError::InsufficientData {
            usable: n,
            required: k + 1,
        });
    }

    let grand_mean = response.iter().sum::<f64>() / n as f64;
    let means: BTreeMap<&K, f64> = levels
        .iter()
        .map(|(level, &(sum, count))| (level, sum / count as f64))
        .collect();

    let ss_between: f64 = levels
        .iter()
        .map(|(level, &(_, count))| count as f64 * (means[level] - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = factor
        .iter()
        .zip(response)
        .map(|(level, &y)| (y - means[level]).powi(2))
        .sum();

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    let f_value = if ms_within == 0.0 {
        if ms_between == 0.0 { f64::NAN } else { f64::INFINITY }
    } else {
        ms_between / ms_within
    };
    let p_value = f_upper_tail(f_value, df_between, df_within);

    let groups = levels
        .iter()
        .map(|(level, &(_, count))| GroupSummary {
            level: level.to_string(),
            n: count,
            mean: means[level],
        })
        .collect();

    log::debug!("ANOVA {response_name} ~ {factor_name}: F = {f_value:.4}, p = {p_value:.4e}");

    Ok(AnovaTable {
        factor_name: factor_name.to_string(),
        response_name: response_name.to_string(),
        factor: AnovaRow {
            df: df_between,
            sum_sq: ss_between,
            mean_sq: ms_between,
        },
        residuals: AnovaRow {
            df: df_within,
            sum_sq: ss_within,
            mean_sq: ms_within,
        },
        f_value,
        p_value,
        groups,
    })
}

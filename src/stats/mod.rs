//! Statistics used by the report: pairwise-complete Pearson correlation,
//! one-way ANOVA and simple OLS regression, plus their text summaries.

pub mod anova;
pub mod correlation;
pub mod regression;
pub mod summary;

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use thiserror::Error;

/// Degenerate model input. Fatal to the model stage; no fallback fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Dimension mismatch: predictor has {predictor} values, response has {response}")]
    LengthMismatch { predictor: usize, response: usize },

    #[error("Factor has {levels} distinct level(s); ANOVA needs at least two")]
    SingleLevel { levels: usize },

    #[error("Insufficient data: {usable} complete observation(s), need at least {required}")]
    InsufficientData { usable: usize, required: usize },

    #[error("Predictor has zero variance; slope is not identifiable")]
    ZeroVariance,
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Upper tail of the F distribution. NaN when the degrees of freedom are
/// not positive or the statistic is not a number.
pub(crate) fn f_upper_tail(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() {
        return f64::NAN;
    }
    if f == f64::INFINITY {
        return 0.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => dist.sf(f),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a t statistic.
pub(crate) fn t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * dist.sf(t.abs()),
        Err(_) => f64::NAN,
    }
}

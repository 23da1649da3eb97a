use serde::Serialize;

use super::{f_upper_tail, t_two_sided, ModelError, ModelResult};

/// Estimate with its inference statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Ordinary least squares fit of `response ~ predictor` with intercept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OlsFit {
    pub predictor_name: String,
    pub response_name: String,
    /// Observations used in the fit.
    pub n: usize,
    pub intercept: Coefficient,
    pub slope: Coefficient,
    pub residual_std_error: f64,
    pub df_residual: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    /// One per input row, input order. NaN where a value was not finite.
    #[serde(skip)]
    pub fitted: Vec<f64>,
    /// One per input row, input order. NaN where a value was not finite.
    #[serde(skip)]
    pub residuals: Vec<f64>,
}

/// Fit `y = a + b x` by least squares.
///
/// Rows with a non-finite value are left out of the fit and get a NaN
/// residual, so the residual vector always lines up with the input.
pub fn fit_simple_ols(
    predictor_name: &str,
    x: &[f64],
    response_name: &str,
    y: &[f64],
) -> ModelResult<OlsFit> {
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            predictor: x.len(),
            response: y.len(),
        });
    }

    let used: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    let n = used.len();
    if n < 2 {
        return Err(ModelError::InsufficientData {
            usable: n,
            required: 2,
        });
    }

    let nf = n as f64;
    let mean_x = used.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = used.iter().map(|p| p.1).sum::<f64>() / nf;
    let sxx: f64 = used.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = used.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let syy: f64 = used.iter().map(|p| (p.1 - mean_y).powi(2)).sum();
    if sxx == 0.0 {
        return Err(ModelError::ZeroVariance);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let fitted: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| {
            if a.is_finite() && b.is_finite() {
                intercept + slope * a
            } else {
                f64::NAN
            }
        })
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(&b, &f)| b - f).collect();

    let sse: f64 = residuals.iter().filter(|r| !r.is_nan()).map(|r| r * r).sum();
    let df_residual = n - 2;
    let df = df_residual as f64;

    let sigma = if df_residual > 0 { (sse / df).sqrt() } else { f64::NAN };
    let se_slope = sigma / sxx.sqrt();
    let se_intercept = sigma * (1.0 / nf + mean_x * mean_x / sxx).sqrt();

    let t_slope = slope / se_slope;
    let t_intercept = intercept / se_intercept;

    let r_squared = if syy == 0.0 { f64::NAN } else { 1.0 - sse / syy };
    let adj_r_squared = if df_residual > 0 {
        1.0 - (1.0 - r_squared) * (nf - 1.0) / df
    } else {
        f64::NAN
    };

    let ssr = syy - sse;
    let f_statistic = if df_residual == 0 {
        f64::NAN
    } else if sse == 0.0 {
        if ssr == 0.0 { f64::NAN } else { f64::INFINITY }
    } else {
        ssr / (sse / df)
    };

    log::debug!(
        "OLS {response_name} ~ {predictor_name}: n = {n}, slope = {slope:.6}, R² = {r_squared:.4}"
    );

    Ok(OlsFit {
        predictor_name: predictor_name.to_string(),
        response_name: response_name.to_string(),
        n,
        intercept: Coefficient {
            estimate: intercept,
            std_error: se_intercept,
            t_value: t_intercept,
            p_value: t_two_sided(t_intercept, df),
        },
        slope: Coefficient {
            estimate: slope,
            std_error: se_slope,
            t_value: t_slope,
            p_value: t_two_sided(t_slope, df),
        },
        residual_std_error: sigma,
        df_residual,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value: f_upper_tail(f_statistic, 1.0, df),
        fitted,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> OlsFit {
        // lm(y ~ x) on x = 1:5, y = c(2, 4, 5, 4, 5):
        //   intercept 2.2 (se 0.9381), slope 0.6 (se 0.2828, p 0.1240)
        //   R² 0.6, adj R² 0.4667, F 4.5 on 1 and 3 df
        fit_simple_ols("x", &[1.0, 2.0, 3.0, 4.0, 5.0], "y", &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap()
    }

    #[test]
    fn matches_reference_fit() {
        let fit = reference();
        assert!((fit.intercept.estimate - 2.2).abs() < 1e-12);
        assert!((fit.slope.estimate - 0.6).abs() < 1e-12);
        assert!((fit.slope.std_error - 0.282843).abs() < 1e-5);
        assert!((fit.intercept.std_error - 0.938083).abs() < 1e-5);
        assert!((fit.slope.p_value - 0.1240).abs() < 1e-3);
        assert!((fit.r_squared - 0.6).abs() < 1e-12);
        assert!((fit.adj_r_squared - 0.466667).abs() < 1e-5);
        assert!((fit.f_statistic - 4.5).abs() < 1e-9);
        assert!((fit.f_p_value - fit.slope.p_value).abs() < 1e-9);
        assert_eq!(fit.df_residual, 3);
    }

    #[test]
    fn residuals_line_up_and_sum_to_zero() {
        let fit = reference();
        assert_eq!(fit.residuals.len(), 5);
        assert!(fit.residuals.iter().sum::<f64>().abs() < 1e-9);
        assert!((fit.residuals[0] - (2.0 - 2.8)).abs() < 1e-12);
        assert!((fit.fitted[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_rows_keep_their_slot() {
        let fit = fit_simple_ols(
            "x",
            &[1.0, f64::NAN, 2.0, 3.0],
            "y",
            &[1.0, 5.0, 2.1, 2.9],
        )
        .unwrap();
        assert_eq!(fit.n, 3);
        assert_eq!(fit.residuals.len(), 4);
        assert!(fit.residuals[1].is_nan());
    }

    #[test]
    fn degenerate_inputs_fail() {
        assert_eq!(
            fit_simple_ols("x", &[1.0], "y", &[2.0]).unwrap_err(),
            ModelError::InsufficientData { usable: 1, required: 2 }
        );
        assert_eq!(
            fit_simple_ols("x", &[3.0, 3.0, 3.0], "y", &[1.0, 2.0, 3.0]).unwrap_err(),
            ModelError::ZeroVariance
        );
        assert!(matches!(
            fit_simple_ols("x", &[1.0, 2.0], "y", &[1.0]),
            Err(ModelError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn two_points_fit_exactly_without_inference() {
        let fit = fit_simple_ols("x", &[0.0, 1.0], "y", &[1.0, 3.0]).unwrap();
        assert_eq!(fit.slope.estimate, 2.0);
        assert!(fit.slope.p_value.is_nan());
        assert!(fit.adj_r_squared.is_nan());
    }

    #[test]
    fn refitting_is_bit_identical() {
        let a = reference();
        let b = reference();
        assert_eq!(a.slope.estimate.to_bits(), b.slope.estimate.to_bits());
        assert_eq!(a.slope.p_value.to_bits(), b.slope.p_value.to_bits());
        assert_eq!(a.r_squared.to_bits(), b.r_squared.to_bits());
    }
}

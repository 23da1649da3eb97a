use std::fmt::Write;

use super::anova::AnovaTable;
use super::regression::{Coefficient, OlsFit};

/// Format a p-value the way statistical tables usually do.
pub fn format_p(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < 2.2e-16 {
        "< 2.2e-16".to_string()
    } else if p < 1e-4 {
        format!("{p:.3e}")
    } else {
        format!("{p:.4}")
    }
}

/// Significance stars: `***` < 0.001, `**` < 0.01, `*` < 0.05, `.` < 0.1.
pub fn stars(p: f64) -> &'static str {
    match p {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        p if p < 0.1 => ".",
        _ => "",
    }
}

/// ANOVA table plus per-group means and the verdict at `alpha`.
pub fn anova_summary(table: &AnovaTable, alpha: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "One-way ANOVA: {} ~ {}", table.response_name, table.factor_name);
    let _ = writeln!(
        out,
        "{:<12} {:>6} {:>16} {:>16} {:>10} {:>12}",
        "", "Df", "Sum Sq", "Mean Sq", "F value", "Pr(>F)"
    );
    let _ = writeln!(
        out,
        "{:<12} {:>6} {:>16.2} {:>16.2} {:>10.4} {:>12} {}",
        table.factor_name,
        table.factor.df,
        table.factor.sum_sq,
        table.factor.mean_sq,
        table.f_value,
        format_p(table.p_value),
        stars(table.p_value)
    );
    let _ = writeln!(
        out,
        "{:<12} {:>6} {:>16.2} {:>16.2}",
        "Residuals", table.residuals.df, table.residuals.sum_sq, table.residuals.mean_sq
    );
    out.push('\n');
    for g in &table.groups {
        let _ = writeln!(out, "  {} = {:<6} n = {:<6} mean {} = {:.3}", table.factor_name, g.level, g.n, table.response_name, g.mean);
    }
    out.push('\n');
    let verdict = if table.p_value.is_nan() {
        format!(
            "p is undefined: the test cannot decide whether mean {} differs between {} groups.",
            table.response_name, table.factor_name
        )
    } else if table.is_significant(alpha) {
        format!(
            "p = {} < {alpha}: reject the null hypothesis; mean {} differs between {} groups.",
            format_p(table.p_value),
            table.response_name,
            table.factor_name
        )
    } else {
        format!(
            "p = {} >= {alpha}: no evidence that mean {} differs between {} groups.",
            format_p(table.p_value),
            table.response_name,
            table.factor_name
        )
    };
    out.push_str(&verdict);
    out.push('\n');
    out
}

fn coefficient_line(out: &mut String, name: &str, c: &Coefficient) {
    let _ = writeln!(
        out,
        "{:<12} {:>14.6} {:>14.6} {:>9.3} {:>12} {}",
        name,
        c.estimate,
        c.std_error,
        c.t_value,
        format_p(c.p_value),
        stars(c.p_value)
    );
}

/// Coefficient table and goodness-of-fit lines for a simple regression.
pub fn regression_summary(fit: &OlsFit, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "Linear model: {} ~ {}  (n = {})", fit.response_name, fit.predictor_name, fit.n);
    let _ = writeln!(out, "Coefficients:");
    let _ = writeln!(
        out,
        "{:<12} {:>14} {:>14} {:>9} {:>12}",
        "", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
    );
    coefficient_line(&mut out, "(Intercept)", &fit.intercept);
    coefficient_line(&mut out, &fit.predictor_name, &fit.slope);
    out.push_str("---\nSignif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1\n\n");
    let _ = writeln!(
        out,
        "Residual standard error: {:.4} on {} degrees of freedom",
        fit.residual_std_error, fit.df_residual
    );
    let _ = writeln!(
        out,
        "Multiple R-squared: {:.4},\tAdjusted R-squared: {:.4}",
        fit.r_squared, fit.adj_r_squared
    );
    let _ = writeln!(
        out,
        "F-statistic: {:.3} on 1 and {} DF,  p-value: {}",
        fit.f_statistic,
        fit.df_residual,
        format_p(fit.f_p_value)
    );
    out
}

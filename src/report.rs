use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::data::filter;
use crate::data::loader;
use crate::data::model::{record_columns, PlotRecord, PlotTable, Variable};
use crate::geo::Region;
use crate::render::{self, ResidualPoint};
use crate::stats::anova::{one_way_anova, AnovaTable};
use crate::stats::correlation::{correlation_matrix, CorrelationMatrix};
use crate::stats::regression::{fit_simple_ols, OlsFit};
use crate::stats::summary::{anova_summary, regression_summary};
use crate::stats::ModelResult;

/// Columns fed to the correlation plots.
const CORRELATED: [Variable; 6] = [
    Variable::Biomass,
    Variable::Diameter,
    Variable::Height,
    Variable::Elevation,
    Variable::TreeCount,
    Variable::Burned,
];

/// Legend bins on the static residual map.
const RESIDUAL_BINS: usize = 6;

// ---------------------------------------------------------------------------
// Pipeline values
// ---------------------------------------------------------------------------

/// Output of a full run. Every stage is a separate immutable value.
#[derive(Debug, Clone)]
pub struct Report {
    pub config: ReportConfig,
    pub region: Region,
    pub loaded_rows: usize,
    /// Rows left after dropping nulls.
    pub complete: Vec<PlotRecord>,
    /// Complete rows inside the outlier thresholds.
    pub filtered: Vec<PlotRecord>,
    pub focus_year: Option<i64>,
    pub correlation_all: CorrelationMatrix,
    pub correlation_year: Option<CorrelationMatrix>,
    pub anova: ModelResult<AnovaTable>,
    pub fit_year: Option<ModelResult<OlsFit>>,
    pub fit_all: ModelResult<OlsFit>,
    pub residuals_year: Vec<ResidualPoint>,
    pub residuals_all: Vec<ResidualPoint>,
    /// Human-readable model summaries, as written to `summary.txt`.
    pub summary_text: String,
}

/// Serializable slice of the report for `summary.json`.
#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    config: &'a ReportConfig,
    loaded_rows: usize,
    complete_rows: usize,
    filtered_rows: usize,
    focus_year: Option<i64>,
    correlation_all: &'a CorrelationMatrix,
    correlation_year: Option<&'a CorrelationMatrix>,
    anova: Option<&'a AnovaTable>,
    regression_year: Option<&'a OlsFit>,
    regression_all: Option<&'a OlsFit>,
    errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Run the whole analysis top to bottom and write every artifact into
/// `config.output_dir`. Only an unreadable input or an unwritable output
/// aborts the run; a degenerate model is reported and skipped.
pub fn run(config: &ReportConfig) -> Result<Report> {
    log::info!("Loading {}", config.input.display());
    let table = loader::load_file(&config.input)?;
    let region = Region::load_or_default(config.boundary.as_deref());
    analyse(config, &table, region)
}

/// Everything after loading.
pub fn analyse(config: &ReportConfig, table: &PlotTable, region: Region) -> Result<Report> {
    let out = config.output_dir.as_path();
    if table.is_empty() {
        log::warn!("{} holds no plots", table.source);
    }

    // -- clean: nulls --
    let complete = filter::drop_incomplete(table);
    log::info!("{} of {} plots are complete", complete.len(), table.len());

    let locations: Vec<[f64; 2]> = complete.iter().map(|r| [r.longitude, r.latitude]).collect();
    render::render_locations(&out.join("locations.svg"), &region, &locations)?;

    // -- explore: before outlier removal --
    render::render_scatter_matrix(
        &out.join("scatter_matrix_full.svg"),
        "All variables",
        &record_columns(&complete, &Variable::ALL),
    )?;
    render::render_scatter_matrix(
        &out.join("scatter_matrix_relevant.svg"),
        "Relevant variables",
        &record_columns(&complete, &Variable::RELEVANT),
    )?;

    // -- clean: outliers --
    let filtered = filter::filter_outliers(&complete, &config.thresholds);
    log::info!("{} plots remain after outlier filtering", filtered.len());
    render::render_scatter_matrix(
        &out.join("scatter_matrix_filtered.svg"),
        &format!(
            "Relevant variables, height < {} and diameter < {}",
            config.thresholds.max_height, config.thresholds.max_diameter
        ),
        &record_columns(&filtered, &Variable::RELEVANT),
    )?;

    let focus_year = config.focus_year.or_else(|| filter::latest_year(&filtered));
    let year_subset = focus_year.map(|y| filter::subset_year(&filtered, y));

    // -- explore: correlations --
    let correlation_all = correlation_matrix(&record_columns(&filtered, &CORRELATED));
    render::render_correlation(&out.join("correlation_all.svg"), "Correlation, all years", &correlation_all)?;

    let correlation_year = match (focus_year, &year_subset) {
        (Some(year), Some(subset)) => {
            let m = correlation_matrix(&record_columns(subset, &CORRELATED));
            render::render_correlation(
                &out.join(format!("correlation_{year}.svg")),
                &format!("Correlation, {year}"),
                &m,
            )?;
            Some(m)
        }
        _ => None,
    };

    render::render_group_boxplots(&out.join("boxplots_burned.svg"), &filtered, &Variable::MEASURED)?;

    // -- model --
    let anova = fit_anova(&filtered);
    let fit_year = year_subset.as_deref().map(fit_height_on_elevation);
    let fit_all = fit_height_on_elevation(&filtered);

    // -- map --
    let residuals_year = match (&fit_year, &year_subset) {
        (Some(Ok(fit)), Some(subset)) => attach_residuals(subset, fit),
        _ => Vec::new(),
    };
    let residuals_all = match &fit_all {
        Ok(fit) => attach_residuals(&filtered, fit),
        Err(_) => Vec::new(),
    };
    if let (Some(year), false) = (focus_year, residuals_year.is_empty()) {
        render::render_residual_map(
            &out.join(format!("residuals_{year}.svg")),
            &format!("Residuals of height ~ elevation, {year}"),
            &region,
            &residuals_year,
            RESIDUAL_BINS,
        )?;
    }

    let mut report = Report {
        config: config.clone(),
        region,
        loaded_rows: table.len(),
        complete,
        filtered,
        focus_year,
        correlation_all,
        correlation_year,
        anova,
        fit_year,
        fit_all,
        residuals_year,
        residuals_all,
        summary_text: String::new(),
    };
    report.summary_text = summary_text(&report);
    write_summaries(out, &report)?;
    Ok(report)
}

fn fit_anova(records: &[PlotRecord]) -> ModelResult<AnovaTable> {
    let burned: Vec<bool> = records.iter().map(|r| r.burned).collect();
    let elevation: Vec<f64> = records.iter().map(|r| r.elevation).collect();
    let result = one_way_anova("burned", &burned, "elevation", &elevation);
    if let Err(e) = &result {
        log::error!("ANOVA skipped: {e}");
    }
    result
}

fn fit_height_on_elevation(records: &[PlotRecord]) -> ModelResult<OlsFit> {
    let elevation: Vec<f64> = records.iter().map(|r| r.elevation).collect();
    let height: Vec<f64> = records.iter().map(|r| r.height).collect();
    let result = fit_simple_ols("elevation", &elevation, "height", &height);
    if let Err(e) = &result {
        log::error!("Regression skipped: {e}");
    }
    result
}

/// Pair each record with its residual; the fit's residuals are in record order.
pub fn attach_residuals(records: &[PlotRecord], fit: &OlsFit) -> Vec<ResidualPoint> {
    records
        .iter()
        .zip(&fit.residuals)
        .map(|(r, &residual)| ResidualPoint {
            longitude: r.longitude,
            latitude: r.latitude,
            year: r.year,
            residual,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

fn summary_text(report: &Report) -> String {
    let alpha = report.config.significance_level;
    let mut out = String::new();
    let _ = writeln!(out, "Plots loaded:            {}", report.loaded_rows);
    let _ = writeln!(out, "Complete plots:          {}", report.complete.len());
    let _ = writeln!(out, "After outlier filtering: {}", report.filtered.len());
    if let Some(year) = report.focus_year {
        let _ = writeln!(out, "Single-year view:        {year}");
    }
    if let Some(r) = report.correlation_all.get(Variable::Height, Variable::Elevation) {
        let _ = writeln!(out, "r(height, elevation):    {r:.3}");
    }
    out.push('\n');

    match &report.anova {
        Ok(table) => out.push_str(&anova_summary(table, alpha)),
        Err(e) => {
            let _ = writeln!(out, "ANOVA not fitted: {e}");
        }
    }
    out.push('\n');

    if let (Some(year), Some(fit)) = (report.focus_year, &report.fit_year) {
        match fit {
            Ok(fit) => out.push_str(&regression_summary(fit, &format!("Regression, {year} only"))),
            Err(e) => {
                let _ = writeln!(out, "Regression for {year} not fitted: {e}");
            }
        }
        out.push('\n');
    }
    match &report.fit_all {
        Ok(fit) => out.push_str(&regression_summary(fit, "Regression, all years")),
        Err(e) => {
            let _ = writeln!(out, "Regression for all years not fitted: {e}");
        }
    }
    out
}

fn write_summaries(out: &Path, report: &Report) -> Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let text_path = out.join("summary.txt");
    std::fs::write(&text_path, &report.summary_text)
        .with_context(|| format!("writing {}", text_path.display()))?;

    let mut errors = Vec::new();
    if let Err(e) = &report.anova {
        errors.push(format!("anova: {e}"));
    }
    if let Some(Err(e)) = &report.fit_year {
        errors.push(format!("regression_year: {e}"));
    }
    if let Err(e) = &report.fit_all {
        errors.push(format!("regression_all: {e}"));
    }

    let json = JsonSummary {
        config: &report.config,
        loaded_rows: report.loaded_rows,
        complete_rows: report.complete.len(),
        filtered_rows: report.filtered.len(),
        focus_year: report.focus_year,
        correlation_all: &report.correlation_all,
        correlation_year: report.correlation_year.as_ref(),
        anova: report.anova.as_ref().ok(),
        regression_year: report.fit_year.as_ref().and_then(|f| f.as_ref().ok()),
        regression_all: report.fit_all.as_ref().ok(),
        errors,
    };
    let json_path = out.join("summary.json");
    let text = serde_json::to_string_pretty(&json).context("serializing summary")?;
    std::fs::write(&json_path, text).with_context(|| format!("writing {}", json_path.display()))?;

    log::info!("Wrote summaries to {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PlotRow;
    use crate::render::test_support::scratch_dir;

    fn synthetic_table() -> PlotTable {
        let rows = (0..120)
            .map(|i| {
                let elevation = 200.0 + (i * 37 % 1800) as f64;
                let noise = ((i * 7919) % 97) as f64 - 48.0;
                PlotRow {
                    plot_id: Some(format!("p{i}")),
                    year: Some(2010 + (i % 3) as i64),
                    biomass: Some(30.0 + (i % 11) as f64 * 4.0),
                    diameter: Some(if i == 5 { 400.0 } else { 6.0 + (i % 17) as f64 }),
                    height: Some(if i == 9 { 9000.0 } else { 90.0 - elevation * 0.01 + noise }),
                    elevation: Some(elevation),
                    tree_count: Some((i % 25) as i64),
                    burned: if i == 13 { None } else { Some(i % 5 == 0) },
                    longitude: Some(-124.0 + (i % 13) as f64 * 0.5),
                    latitude: Some(42.2 + (i % 9) as f64 * 0.45),
                }
            })
            .collect();
        PlotTable::new("synthetic", rows)
    }

    fn config(name: &str) -> ReportConfig {
        ReportConfig {
            output_dir: scratch_dir(name),
            ..ReportConfig::default()
        }
    }

    #[test]
    fn full_run_writes_every_artifact() {
        let cfg = config("report_full");
        let report = analyse(&cfg, &synthetic_table(), Region::oregon()).unwrap();

        assert_eq!(report.loaded_rows, 120);
        assert_eq!(report.complete.len(), 119);
        assert_eq!(report.filtered.len(), 117);
        assert_eq!(report.focus_year, Some(2012));
        assert!(report.summary_text.contains("r(height, elevation)"));

        for name in [
            "locations.svg",
            "scatter_matrix_full.svg",
            "scatter_matrix_relevant.svg",
            "scatter_matrix_filtered.svg",
            "correlation_all.svg",
            "correlation_2012.svg",
            "boxplots_burned.svg",
            "residuals_2012.svg",
            "summary.txt",
            "summary.json",
        ] {
            assert!(cfg.output_dir.join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn both_regressions_produce_slope_and_p_value() {
        let report = analyse(&config("report_fits"), &synthetic_table(), Region::oregon()).unwrap();
        let year = report.fit_year.as_ref().unwrap().as_ref().unwrap();
        let all = report.fit_all.as_ref().unwrap();
        for fit in [year, all] {
            assert!(fit.slope.estimate.is_finite());
            assert!(fit.slope.p_value.is_finite());
            assert!(fit.residuals.iter().sum::<f64>().abs() < 1e-6);
        }
        assert_eq!(report.residuals_all.len(), report.filtered.len());
        assert_eq!(report.residuals_year.len(), year.n);
    }

    #[test]
    fn reruns_are_identical() {
        let table = synthetic_table();
        let a = analyse(&config("report_a"), &table, Region::oregon()).unwrap();
        let b = analyse(&config("report_b"), &table, Region::oregon()).unwrap();
        assert_eq!(a.filtered, b.filtered);
        assert_eq!(a.summary_text, b.summary_text);
        let (fa, fb) = (a.fit_all.unwrap(), b.fit_all.unwrap());
        assert_eq!(fa.slope.estimate.to_bits(), fb.slope.estimate.to_bits());
        assert_eq!(fa.adj_r_squared.to_bits(), fb.adj_r_squared.to_bits());
    }

    #[test]
    fn single_level_burn_flag_skips_only_the_anova() {
        let mut table = synthetic_table();
        for row in &mut table.rows {
            row.burned = Some(false);
        }
        let report = analyse(&config("report_single_level"), &table, Region::oregon()).unwrap();
        assert!(report.anova.is_err());
        assert!(report.fit_all.is_ok());
        assert!(report.summary_text.contains("ANOVA not fitted"));
    }

    #[test]
    fn missing_input_is_fatal() {
        let cfg = ReportConfig {
            input: "/no/such/plots.shp".into(),
            ..config("report_missing")
        };
        assert!(run(&cfg).is_err());
    }
}

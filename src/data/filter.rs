use crate::config::Thresholds;

use super::model::{PlotRecord, PlotTable};

// ---------------------------------------------------------------------------
// Cleaning stages
// ---------------------------------------------------------------------------

/// Drop every row with a null in any tracked column. Row order is kept.
pub fn drop_incomplete(table: &PlotTable) -> Vec<PlotRecord> {
    let records: Vec<PlotRecord> = table.rows.iter().filter_map(|r| r.to_record()).collect();
    log::debug!(
        "Dropped {} of {} rows with missing values",
        table.len() - records.len(),
        table.len()
    );
    records
}

/// Keep rows with `height < max_height` and `diameter < max_diameter`.
pub fn filter_outliers(records: &[PlotRecord], thresholds: &Thresholds) -> Vec<PlotRecord> {
    let kept: Vec<PlotRecord> = records
        .iter()
        .filter(|r| r.height < thresholds.max_height && r.diameter < thresholds.max_diameter)
        .cloned()
        .collect();
    log::debug!(
        "Dropped {} outliers (height >= {}, diameter >= {})",
        records.len() - kept.len(),
        thresholds.max_height,
        thresholds.max_diameter
    );
    kept
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Copy of the records sampled in `year`.
pub fn subset_year(records: &[PlotRecord], year: i64) -> Vec<PlotRecord> {
    records.iter().filter(|r| r.year == year).cloned().collect()
}

/// Most recent sample year present.
pub fn latest_year(records: &[PlotRecord]) -> Option<i64> {
    records.iter().map(|r| r.year).max()
}

/// Distinct sample years, ascending.
pub fn distinct_years(years: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut years: Vec<i64> = years.into_iter().collect();
    years.sort_unstable();
    years.dedup();
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PlotRow;

    fn clean(table: &PlotTable, thresholds: &Thresholds) -> Vec<PlotRecord> {
        filter_outliers(&drop_incomplete(table), thresholds)
    }

    fn row(i: usize) -> PlotRow {
        PlotRow {
            plot_id: Some(format!("p{i}")),
            year: Some(2010 + (i % 3) as i64),
            biomass: Some(10.0 + i as f64),
            diameter: Some(5.0 + (i % 50) as f64),
            height: Some(30.0 + (i % 40) as f64),
            elevation: Some(200.0 + 3.0 * i as f64),
            tree_count: Some((i % 20) as i64),
            burned: Some(i % 4 == 0),
            longitude: Some(-123.0 + (i % 10) as f64 * 0.5),
            latitude: Some(42.5 + (i % 7) as f64 * 0.4),
        }
    }

    #[test]
    fn twelve_null_diameters_out_of_a_thousand() {
        let rows: Vec<PlotRow> = (0..1000)
            .map(|i| {
                let mut r = row(i);
                if i % 83 == 0 && i < 12 * 83 {
                    r.diameter = None;
                }
                r
            })
            .collect();
        assert_eq!(rows.iter().filter(|r| r.diameter.is_none()).count(), 12);

        let cleaned = clean(&PlotTable::new("t", rows), &Thresholds::default());
        assert!(cleaned.len() <= 988);
        assert_eq!(cleaned.len(), 988);
    }

    #[test]
    fn membership_matches_nulls_and_thresholds() {
        let mut rows: Vec<PlotRow> = (0..20).map(row).collect();
        rows[1].height = Some(7000.0);
        rows[2].height = Some(6999.9);
        rows[3].diameter = Some(120.0);
        rows[4].diameter = Some(119.99);
        rows[5].elevation = None;
        rows[6].longitude = None;
        let table = PlotTable::new("t", rows.clone());

        let cleaned = clean(&table, &Thresholds::default());
        for r in &rows {
            let expected = r.to_record().is_some_and(|rec| rec.height < 7000.0 && rec.diameter < 120.0);
            let present = cleaned.iter().any(|c| Some(&c.plot_id) == r.plot_id.as_ref());
            assert_eq!(expected, present, "row {:?}", r.plot_id);
        }
        assert_eq!(cleaned.len(), 16);
    }

    #[test]
    fn cleaning_is_pure_and_repeatable() {
        let table = PlotTable::new("t", (0..50).map(row).collect());
        let first = clean(&table, &Thresholds::default());
        let second = clean(&table, &Thresholds::default());
        assert_eq!(first, second);
        assert_eq!(table.len(), 50);
    }

    #[test]
    fn year_views() {
        let records = drop_incomplete(&PlotTable::new("t", (0..9).map(row).collect()));
        assert_eq!(distinct_years(records.iter().map(|r| r.year)), vec![2010, 2011, 2012]);
        assert_eq!(distinct_years([2012, 2010, 2012]), vec![2010, 2012]);
        assert_eq!(latest_year(&records), Some(2012));
        let subset = subset_year(&records, 2011);
        assert_eq!(subset.len(), 3);
        assert!(subset.iter().all(|r| r.year == 2011));
        assert_eq!(latest_year(&[]), None);
    }
}

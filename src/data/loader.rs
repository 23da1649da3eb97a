use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use shapefile::dbase::FieldValue;
use shapefile::Shape;

use super::model::{CellValue, PlotTable};
use super::schema::{self, Schema};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the plot table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.shp`     – point shapefile with its `.dbf` attribute table (primary)
/// * `.csv`     – attribute columns plus `longitude` / `latitude`
/// * `.geojson` – FeatureCollection of Point features
/// * `.parquet` – flat table, same columns as the CSV layout
///
/// A missing or unreadable file is fatal; there is no retry.
pub fn load_file(path: &Path) -> Result<PlotTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "shp" => load_shapefile(path),
        "csv" => load_csv(path),
        "geojson" | "json" => load_geojson(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("Loaded {} plots from {}", table.len(), table.source);
    Ok(table)
}

// ---------------------------------------------------------------------------
// Shapefile loader
// ---------------------------------------------------------------------------

/// Read point geometries and their dBase attributes. Longitude / latitude
/// come from the geometry; a null shape leaves both coordinates empty.
fn load_shapefile(path: &Path) -> Result<PlotTable> {
    let mut reader = shapefile::Reader::from_path(path).context("opening shapefile")?;
    let mut rows = Vec::new();
    let mut schema: Option<(Vec<String>, Schema)> = None;

    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.with_context(|| format!("reading shape {i}"))?;

        let (longitude, latitude) = match shape {
            Shape::Point(p) => (Some(p.x), Some(p.y)),
            Shape::PointM(p) => (Some(p.x), Some(p.y)),
            Shape::PointZ(p) => (Some(p.x), Some(p.y)),
            Shape::NullShape => (None, None),
            other => bail!("Shape {i}: expected a point geometry, got {:?}", other.shapetype()),
        };

        let fields: HashMap<String, FieldValue> = record.into();
        if schema.is_none() {
            let names: Vec<String> = fields.keys().cloned().collect();
            let resolved = Schema::resolve(&names)?;
            schema = Some((names, resolved));
        }
        let (names, resolved) = schema.as_ref().context("attribute schema not resolved")?;

        let cells: Vec<CellValue> = names
            .iter()
            .map(|name| fields.get(name).map(dbase_to_cell).unwrap_or(CellValue::Null))
            .collect();
        rows.push(resolved.row(&cells, longitude, latitude));
    }

    Ok(PlotTable::new(path.display().to_string(), rows))
}

fn dbase_to_cell(value: &FieldValue) -> CellValue {
    match value {
        FieldValue::Character(Some(s)) => CellValue::String(s.clone()),
        FieldValue::Numeric(Some(v)) => CellValue::Float(*v),
        FieldValue::Float(Some(v)) => CellValue::Float(*v as f64),
        FieldValue::Double(v) => CellValue::Float(*v),
        FieldValue::Integer(i) => CellValue::Integer(*i as i64),
        FieldValue::Logical(Some(b)) => CellValue::Bool(*b),
        _ => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the attribute names plus `longitude` and
/// `latitude`. Empty cells are nulls.
fn load_csv(path: &Path) -> Result<PlotTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let schema = Schema::resolve(&headers)?;
    let lon_idx = schema::find(&headers, schema::LONGITUDE).context("CSV missing 'longitude' column")?;
    let lat_idx = schema::find(&headers, schema::LATITUDE).context("CSV missing 'latitude' column")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: Vec<CellValue> = record.iter().map(guess_cell_type).collect();
        let lon = cells.get(lon_idx).and_then(CellValue::as_f64);
        let lat = cells.get(lat_idx).and_then(CellValue::as_f64);
        rows.push(schema.row(&cells, lon, lat));
    }

    Ok(PlotTable::new(path.display().to_string(), rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// GeoJSON loader
// ---------------------------------------------------------------------------

/// Expected layout:
///
/// ```json
/// { "type": "FeatureCollection",
///   "features": [
///     { "type": "Feature",
///       "geometry": { "type": "Point", "coordinates": [-121.3, 44.1] },
///       "properties": { "PLT_CN": "1234", "INVYR": 2012, ... } } ] }
/// ```
fn load_geojson(path: &Path) -> Result<PlotTable> {
    let text = std::fs::read_to_string(path).context("reading GeoJSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing GeoJSON")?;

    let features = root
        .get("features")
        .and_then(|f| f.as_array())
        .context("Expected a FeatureCollection with a 'features' array")?;

    let mut rows = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let props = feature
            .get("properties")
            .and_then(|p| p.as_object())
            .with_context(|| format!("Feature {i} has no properties object"))?;

        let names: Vec<&String> = props.keys().collect();
        let schema = Schema::resolve(&names).with_context(|| format!("Feature {i}"))?;
        let cells: Vec<CellValue> = props.values().map(json_to_cell).collect();

        let (lon, lat) = point_coordinates(feature.get("geometry"))
            .with_context(|| format!("Feature {i}"))?;
        rows.push(schema.row(&cells, lon, lat));
    }

    Ok(PlotTable::new(path.display().to_string(), rows))
}

fn point_coordinates(geometry: Option<&JsonValue>) -> Result<(Option<f64>, Option<f64>)> {
    let Some(geometry) = geometry.filter(|g| !g.is_null()) else {
        return Ok((None, None));
    };
    let kind = geometry.get("type").and_then(|t| t.as_str()).unwrap_or("");
    if kind != "Point" {
        bail!("expected a Point geometry, got '{kind}'");
    }
    let coords = geometry
        .get("coordinates")
        .and_then(|c| c.as_array())
        .context("Point geometry without coordinates")?;
    Ok((
        coords.first().and_then(|v| v.as_f64()),
        coords.get(1).and_then(|v| v.as_f64()),
    ))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet table with the attribute columns and `longitude` /
/// `latitude`. Works with files written by Pandas and Polars.
fn load_parquet(path: &Path) -> Result<PlotTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let arrow_schema = batch.schema();
        let names: Vec<&String> = arrow_schema.fields().iter().map(|f| f.name()).collect();

        let schema = Schema::resolve(&names)?;
        let lon_idx =
            schema::find(&names, schema::LONGITUDE).context("Parquet file missing 'longitude' column")?;
        let lat_idx =
            schema::find(&names, schema::LATITUDE).context("Parquet file missing 'latitude' column")?;

        for row in 0..batch.num_rows() {
            let cells: Vec<CellValue> = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect();
            let lon = cells[lon_idx].as_f64();
            let lat = cells[lat_idx].as_f64();
            rows.push(schema.row(&cells, lon, lat));
        }
    }

    Ok(PlotTable::new(path.display().to_string(), rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use arrow::array::ArrayRef;
    use arrow::datatypes::{Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use shapefile::dbase::{FieldName, Record, TableWriterBuilder};
    use shapefile::{Point, Polyline};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("forest_eda_{}_{name}", std::process::id()))
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = scratch_path(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn field(name: &str) -> FieldName {
        FieldName::try_from(name).unwrap()
    }

    fn remove_shapefile(path: &Path) {
        for ext in ["shp", "shx", "dbf"] {
            std::fs::remove_file(path.with_extension(ext)).ok();
        }
    }

    fn plot_table_builder() -> TableWriterBuilder {
        TableWriterBuilder::new()
            .add_character_field(field("PLT_CN"), 20)
            .add_numeric_field(field("INVYR"), 6, 0)
            .add_numeric_field(field("BIO_ACRE"), 12, 3)
            .add_numeric_field(field("DIA"), 10, 3)
            .add_numeric_field(field("HT"), 10, 3)
            .add_numeric_field(field("ELEV"), 10, 1)
            .add_numeric_field(field("CNT"), 6, 0)
            .add_numeric_field(field("BURNED"), 2, 0)
    }

    fn plot_record(id: &str, diameter: Option<f64>, burned: f64) -> Record {
        let mut record = Record::default();
        record.insert("PLT_CN".to_string(), FieldValue::Character(Some(id.to_string())));
        record.insert("INVYR".to_string(), FieldValue::Numeric(Some(2012.0)));
        record.insert("BIO_ACRE".to_string(), FieldValue::Numeric(Some(35.5)));
        record.insert("DIA".to_string(), FieldValue::Numeric(diameter));
        record.insert("HT".to_string(), FieldValue::Numeric(Some(58.0)));
        record.insert("ELEV".to_string(), FieldValue::Numeric(Some(1210.0)));
        record.insert("CNT".to_string(), FieldValue::Numeric(Some(9.0)));
        record.insert("BURNED".to_string(), FieldValue::Numeric(Some(burned)));
        record
    }

    fn write_parquet(name: &str, columns: Vec<(&str, ArrayRef)>) -> PathBuf {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(n, a)| Field::new(*n, a.data_type().clone(), true))
            .collect();
        let arrow_schema = Arc::new(ArrowSchema::new(fields));
        let batch =
            RecordBatch::try_new(arrow_schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
                .unwrap();

        let path = scratch_path(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, arrow_schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn parquet_plot_columns() -> Vec<(&'static str, ArrayRef)> {
        vec![
            ("plt_cn", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
            ("Invyr", Arc::new(Int64Array::from(vec![2011, 2012])) as ArrayRef),
            ("bio_acre", Arc::new(Float64Array::from(vec![Some(40.5), None])) as ArrayRef),
            ("Dia", Arc::new(Float32Array::from(vec![10.25f32, 11.0])) as ArrayRef),
            ("ht", Arc::new(Float64Array::from(vec![55.0, 60.0])) as ArrayRef),
            ("ELEV", Arc::new(Float64Array::from(vec![800.0, 950.0])) as ArrayRef),
            ("cnt", Arc::new(Int32Array::from(vec![12, 8])) as ArrayRef),
            ("burned", Arc::new(BooleanArray::from(vec![false, true])) as ArrayRef),
        ]
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_file(Path::new("/definitely/not/here.shp")).unwrap_err();
        assert!(format!("{err:#}").contains("here.shp"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(load_file(Path::new("plots.xlsx")).is_err());
    }

    #[test]
    fn csv_rows_keep_nulls() {
        let path = temp_file(
            "plots.csv",
            "PLT_CN,INVYR,BIO_ACRE,DIA,HT,ELEV,CNT,BURNED,longitude,latitude\n\
             a,2011,40.5,10.2,55,800,12,0,-121.5,44.2\n\
             b,2012,,11.0,60,950,8,1,-122.0,43.9\n",
        );
        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].height, Some(55.0));
        assert_eq!(table.rows[0].longitude, Some(-121.5));
        assert_eq!(table.rows[1].biomass, None);
        assert_eq!(table.rows[1].burned, Some(true));
        assert!(table.rows[1].to_record().is_none());
    }

    #[test]
    fn csv_infinite_values_load_as_missing() {
        let path = temp_file(
            "inf.csv",
            "PLT_CN,INVYR,BIO_ACRE,DIA,HT,ELEV,CNT,BURNED,longitude,latitude\n\
             a,2011,40.5,10.2,55,inf,12,0,-121.5,44.2\n",
        );
        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.rows[0].elevation, None);
        assert!(table.rows[0].to_record().is_none());
    }

    #[test]
    fn csv_without_required_column_fails() {
        let path = temp_file("broken.csv", "PLT_CN,INVYR,longitude,latitude\na,2011,-121,44\n");
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("BIO_ACRE"));
    }

    #[test]
    fn geojson_points_become_coordinates() {
        let path = temp_file(
            "plots.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[-120.1,45.2]},
                 "properties":{"PLT_CN":"x1","INVYR":2013,"BIO_ACRE":12.5,"DIA":9.0,
                               "HT":40.0,"ELEV":1500.0,"CNT":5,"BURNED":0}},
                {"type":"Feature","geometry":null,
                 "properties":{"PLT_CN":"x2","INVYR":2013,"BIO_ACRE":null,"DIA":9.0,
                               "HT":40.0,"ELEV":1500.0,"CNT":5,"BURNED":1}}]}"#,
        );
        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].longitude, Some(-120.1));
        assert_eq!(table.rows[0].latitude, Some(45.2));
        assert_eq!(table.rows[1].longitude, None);
        assert!(table.rows[0].to_record().is_some());
        assert!(table.rows[1].to_record().is_none());
    }

    #[test]
    fn shapefile_points_and_attributes() {
        let path = scratch_path("plots.shp");
        {
            let mut writer = shapefile::Writer::from_path(&path, plot_table_builder()).unwrap();
            writer
                .write_shape_and_record(&Point::new(-121.0, 44.0), &plot_record("p1", Some(12.5), 0.0))
                .unwrap();
            writer
                .write_shape_and_record(&Point::new(-122.5, 43.1), &plot_record("p2", None, 1.0))
                .unwrap();
            writer
                .write_shape_and_record(&Point::new(-118.2, 45.6), &plot_record("p3", Some(9.0), 1.0))
                .unwrap();
        }
        let table = load_file(&path);
        remove_shapefile(&path);
        let table = table.unwrap();

        assert_eq!(table.len(), 3);
        let first = &table.rows[0];
        assert_eq!(first.plot_id.as_deref(), Some("p1"));
        assert_eq!(first.year, Some(2012));
        assert_eq!(first.tree_count, Some(9));
        assert_eq!(first.burned, Some(false));
        assert_eq!(first.longitude, Some(-121.0));
        assert_eq!(first.latitude, Some(44.0));
        assert!(first.to_record().is_some());

        assert_eq!(table.rows[1].diameter, None);
        assert_eq!(table.rows[1].burned, Some(true));
        assert!(table.rows[1].to_record().is_none());
        assert_eq!(table.rows[2].longitude, Some(-118.2));
    }

    #[test]
    fn shapefile_with_lines_is_rejected() {
        let path = scratch_path("roads.shp");
        {
            let builder = TableWriterBuilder::new().add_character_field(field("NAME"), 10);
            let mut writer = shapefile::Writer::from_path(&path, builder).unwrap();
            let mut record = Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(Some("road".to_string())));
            let line = Polyline::new(vec![Point::new(-121.0, 44.0), Point::new(-120.0, 44.5)]);
            writer.write_shape_and_record(&line, &record).unwrap();
        }
        let result = load_file(&path);
        remove_shapefile(&path);

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("expected a point geometry"));
    }

    #[test]
    fn parquet_columns_resolve_case_insensitively() {
        let mut columns = parquet_plot_columns();
        columns.push(("Longitude", Arc::new(Float64Array::from(vec![-121.5, -122.0])) as ArrayRef));
        columns.push(("LATITUDE", Arc::new(Float64Array::from(vec![44.2, 43.9])) as ArrayRef));
        let path = write_parquet("plots.parquet", columns);
        let table = load_file(&path);
        std::fs::remove_file(&path).ok();
        let table = table.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].plot_id.as_deref(), Some("a"));
        assert_eq!(table.rows[0].year, Some(2011));
        assert_eq!(table.rows[0].diameter, Some(10.25));
        assert_eq!(table.rows[0].tree_count, Some(12));
        assert_eq!(table.rows[0].longitude, Some(-121.5));
        assert_eq!(table.rows[1].latitude, Some(43.9));
        assert_eq!(table.rows[1].burned, Some(true));
        assert_eq!(table.rows[1].biomass, None);
        assert!(table.rows[0].to_record().is_some());
        assert!(table.rows[1].to_record().is_none());
    }

    #[test]
    fn parquet_without_longitude_fails() {
        let mut columns = parquet_plot_columns();
        columns.push(("latitude", Arc::new(Float64Array::from(vec![44.2, 43.9])) as ArrayRef));
        let path = write_parquet("nolon.parquet", columns);
        let result = load_file(&path);
        std::fs::remove_file(&path).ok();

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("longitude"));
    }
}

//! End-to-end conversion tests: `GeoJSON` in, shapefile or GeoPackage out.

use std::fs;
use std::path::Path;

use anyhow::Result;
use geolegacy_core::drivers::OutputFormat;
use geolegacy_core::error::ConversionError;
use geolegacy_core::operations::{
    ConvertOptions, convert, convert_path, convert_reader, convert_stream, inspect_path,
};
use geolegacy_core_common::{FieldKind, GeometryFamily};
use rusqlite::Connection;
use shapefile::dbase::{FieldType, FieldValue};
use shapefile::{Reader, Shape};
use tempfile::TempDir;

fn collection(features: &[&str]) -> String {
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

fn write_input(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("input.geojson");
    fs::write(&path, content).unwrap();
    path
}

fn read_shapefile(path: &Path) -> Vec<(Shape, shapefile::dbase::Record)> {
    let mut reader = Reader::from_path(path).unwrap();
    reader
        .iter_shapes_and_records()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn visible_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

const POINT_A: &str =
    r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[10,20]},"properties":{"name":"A"}}"#;

/// Test the single-point round trip into a shapefile
#[test]
fn test_point_roundtrip_shapefile() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(&input_dir, &collection(&[POINT_A]));

    let options = ConvertOptions::new(OutputFormat::Shapefile, out.path(), "points");
    let report = convert_path(&input, &options)?;

    assert_eq!(report.records_written, 1);
    assert_eq!(report.family, GeometryFamily::Point);
    assert_eq!(
        visible_files(out.path()),
        vec!["points.dbf", "points.prj", "points.shp", "points.shx"]
    );

    let dbf = shapefile::dbase::Reader::from_path(out.path().join("points.dbf"))?;
    let fields = dbf.fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "name");
    assert_eq!(fields[0].field_type(), FieldType::Character);

    let rows = read_shapefile(&out.path().join("points.shp"));
    assert_eq!(rows.len(), 1);
    match &rows[0].0 {
        Shape::Point(p) => assert_eq!((p.x, p.y), (10.0, 20.0)),
        _ => panic!("Expected a point shape"),
    }
    assert_eq!(
        rows[0].1.get("name"),
        Some(&FieldValue::Character(Some("A".to_string())))
    );
    Ok(())
}

/// Test that Integer then Real on the same key yields a Real column
#[test]
fn test_type_promotion_to_real() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(
        &input_dir,
        &collection(&[
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"mixed_num":1}}"#,
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,1]},"properties":{"mixed_num":1.5}}"#,
        ]),
    );

    let options = ConvertOptions::new(OutputFormat::Shapefile, out.path(), "mixed");
    let report = convert_path(&input, &options)?;
    assert_eq!(report.schema.get("mixed_num"), Some(FieldKind::Real));

    let rows = read_shapefile(&out.path().join("mixed.shp"));
    assert_eq!(rows[0].1.get("mixed_num"), Some(&FieldValue::Numeric(Some(1.0))));
    assert_eq!(rows[1].1.get("mixed_num"), Some(&FieldValue::Numeric(Some(1.5))));
    Ok(())
}

/// Test that a Polygon after a Point is dropped rather than failing
#[test]
fn test_mismatched_geometry_is_dropped() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(
        &input_dir,
        &collection(&[
            POINT_A,
            r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]},"properties":{"name":"P"}}"#,
        ]),
    );

    for format in [OutputFormat::Shapefile, OutputFormat::GeoPackage] {
        let options = ConvertOptions::new(format, out.path(), format!("mixed_{}", format.as_str()));
        let report = convert_path(&input, &options)?;
        assert_eq!(report.records_written, 1, "{format}");
        assert_eq!(report.features_skipped, 1, "{format}");
    }

    assert_eq!(read_shapefile(&out.path().join("mixed_shp.shp")).len(), 1);
    let conn = Connection::open(out.path().join("mixed_gpkg.gpkg"))?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM mixed_gpkg", [], |row| row.get(0))?;
    assert_eq!(count, 1);
    Ok(())
}

/// Test that inputs without geometry fail and produce no output
#[test]
fn test_no_geometry_produces_nothing() -> Result<()> {
    let input_dir = TempDir::new()?;
    let inputs = [
        collection(&[]),
        collection(&[r#"{"type":"Feature","geometry":null,"properties":{"a":1}}"#]),
    ];

    for content in inputs {
        let out = TempDir::new()?;
        let input = write_input(&input_dir, &content);
        for format in [OutputFormat::Shapefile, OutputFormat::GeoPackage] {
            let options = ConvertOptions::new(format, out.path(), "empty");
            let err = convert_path(&input, &options).unwrap_err();
            assert!(matches!(err, ConversionError::NoGeometry), "{err}");
            assert!(err.is_input_error());
        }
        assert!(visible_files(out.path()).is_empty());
    }
    Ok(())
}

/// Test that malformed input fails as an input error and leaves nothing behind
#[test]
fn test_malformed_input_leaves_no_output() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    // document cut off inside the first feature
    let content = format!("{}{}", &collection(&[POINT_A])[..120], "@@@");
    let input = write_input(&input_dir, &content);

    let options = ConvertOptions::new(OutputFormat::GeoPackage, out.path(), "broken");
    let err = convert_path(&input, &options).unwrap_err();
    assert!(matches!(err, ConversionError::MalformedInput(_)), "{err}");
    assert!(err.is_input_error());
    assert!(visible_files(out.path()).is_empty());
    Ok(())
}

/// Test MultiPolygon flattening into one record per member, sharing attributes
#[test]
fn test_multipolygon_flattening() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(
        &input_dir,
        &collection(&[
            r#"{"type":"Feature","geometry":{"type":"MultiPolygon","coordinates":[
                [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                [[[5,5],[6,5],[6,6],[5,6],[5,5]]],
                [[[9,9],[10,9],[10,10],[9,10],[9,9]]]
            ]},"properties":{"zone":"Z","code":7}}"#,
        ]),
    );

    let options = ConvertOptions::new(OutputFormat::GeoPackage, out.path(), "zones")
        .with_layer_name("zones_layer");
    let report = convert_path(&input, &options)?;
    assert_eq!(report.family, GeometryFamily::Polygon);
    assert_eq!(report.features_read, 1);
    assert_eq!(report.records_written, 3);

    let conn = Connection::open(out.path().join("zones.gpkg"))?;
    let mut stmt = conn.prepare("SELECT zone, code FROM zones_layer ORDER BY fid")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;
    assert_eq!(rows, vec![("Z".to_string(), 7); 3]);

    let (min_x, max_y): (f64, f64) = conn.query_row(
        "SELECT min_x, max_y FROM gpkg_contents WHERE table_name = 'zones_layer'",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    assert_eq!((min_x, max_y), (0.0, 10.0));
    Ok(())
}

/// Test that permuting the input never changes the schema
#[test]
fn test_schema_is_order_independent() -> Result<()> {
    let features = [
        r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"a":1,"b":true}}"#,
        r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"a":2.5,"c":"x"}}"#,
        r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"b":3,"c":4}}"#,
    ];
    let dir = TempDir::new()?;

    let forward = inspect_path(&write_input(&dir, &collection(&features)))?;
    let reversed: Vec<&str> = features.iter().rev().copied().collect();
    let backward = inspect_path(&write_input(&dir, &collection(&reversed)))?;

    for key in ["a", "b", "c"] {
        assert_eq!(forward.schema.get(key), backward.schema.get(key), "{key}");
    }
    assert_eq!(forward.schema.get("a"), Some(FieldKind::Real));
    assert_eq!(forward.schema.get("b"), Some(FieldKind::Integer));
    assert_eq!(forward.schema.get("c"), Some(FieldKind::Text));
    Ok(())
}

/// Test long and colliding keys end up as unique 10-byte dBASE names
#[test]
fn test_field_names_in_dbf() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(
        &input_dir,
        &collection(&[
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},
                "properties":{"population_2020":1,"population_2021":2,"flag":false}}"#,
        ]),
    );

    let options = ConvertOptions::new(OutputFormat::Shapefile, out.path(), "names");
    let report = convert_path(&input, &options)?;
    assert_eq!(report.field_names.get("population_2021"), Some("populatio1"));

    let rows = read_shapefile(&out.path().join("names.shp"));
    let record = &rows[0].1;
    assert_eq!(record.get("population"), Some(&FieldValue::Numeric(Some(1.0))));
    assert_eq!(record.get("populatio1"), Some(&FieldValue::Numeric(Some(2.0))));
    assert_eq!(record.get("flag"), Some(&FieldValue::Numeric(Some(0.0))));
    Ok(())
}

/// Test that an existing output is never overwritten
#[test]
fn test_existing_output_is_kept() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(&input_dir, &collection(&[POINT_A]));
    fs::write(out.path().join("taken.gpkg"), b"keep me")?;

    let options = ConvertOptions::new(OutputFormat::GeoPackage, out.path(), "taken");
    let err = convert_path(&input, &options).unwrap_err();
    assert!(matches!(err, ConversionError::Config(_)));
    assert_eq!(fs::read(out.path().join("taken.gpkg"))?, b"keep me");
    Ok(())
}

/// Test converting a single-use stream
#[test]
fn test_convert_reader() -> Result<()> {
    let out = TempDir::new()?;
    let content = collection(&[POINT_A, POINT_A]);

    let options = ConvertOptions::new(OutputFormat::GeoPackage, out.path(), "stream");
    let report = convert_reader(content.as_bytes(), &options)?;
    assert_eq!(report.records_written, 2);
    assert_eq!(report.outputs, vec![out.path().join("stream.gpkg")]);
    Ok(())
}

/// Test that unsafe names are rejected before anything is read
#[test]
fn test_unsafe_name_rejected() {
    let out = TempDir::new().unwrap();
    let options = ConvertOptions::new(OutputFormat::Shapefile, out.path(), "../escape");
    let err = convert_reader(&b"not even json"[..], &options).unwrap_err();
    assert!(matches!(err, ConversionError::Config(_)));
    assert!(err.is_input_error());
}

/// Test the async entry points
#[tokio::test]
async fn test_convert_async() -> Result<()> {
    let input_dir = TempDir::new()?;
    let out = TempDir::new()?;
    let input = write_input(&input_dir, &collection(&[POINT_A]));

    let report = convert(
        input,
        ConvertOptions::new(OutputFormat::Shapefile, out.path(), "async"),
    )
    .await?;
    assert_eq!(report.records_written, 1);

    let stream = std::io::Cursor::new(collection(&[POINT_A]).into_bytes());
    let report = convert_stream(
        stream,
        ConvertOptions::new(OutputFormat::GeoPackage, out.path(), "async"),
    )
    .await?;
    assert_eq!(report.records_written, 1);
    Ok(())
}

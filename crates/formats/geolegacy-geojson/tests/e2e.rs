//! End-to-end tests for reading `FeatureCollection` files from disk.

use std::fs;

use geo_types::Geometry;
use geolegacy_core_common::{FeatureSource, PropertyValue, ReadError};
use geolegacy_geojson::GeoJsonSource;
use tempfile::TempDir;

const CITIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [-74.0060, 40.7128]},
      "properties": {"name": "New York", "population": 8336817}
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": {"name": "Nowhere"}
    },
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [-118.2437, 34.0522]},
      "properties": {"name": "Los Angeles", "population": 3979576}
    }
  ]
}"#;

fn write_input(dir: &TempDir, name: &str, content: &str) -> GeoJsonSource {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    GeoJsonSource::new(path)
}

/// Test reading features lazily in input order
#[test]
fn test_read_cities_in_order() {
    let dir = TempDir::new().unwrap();
    let source = write_input(&dir, "cities.geojson", CITIES);

    let features: Vec<_> = source
        .features()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(features.len(), 3);
    assert!(matches!(features[0].geometry, Some(Geometry::Point(_))));
    assert!(features[1].geometry.is_none());
    assert_eq!(
        features[2].property("name"),
        Some(&PropertyValue::Text("Los Angeles".to_string()))
    );
}

/// Test that two traversals of the same source are identical
#[test]
fn test_source_is_restartable() {
    let dir = TempDir::new().unwrap();
    let source = write_input(&dir, "cities.geojson", CITIES);

    let first: Vec<String> = source
        .features()
        .unwrap()
        .map(|f| format!("{:?}", f.unwrap()))
        .collect();
    let second: Vec<String> = source
        .features()
        .unwrap()
        .map(|f| format!("{:?}", f.unwrap()))
        .collect();

    assert_eq!(first, second);
}

/// Test that a broken document fails during iteration, after the valid prefix
#[test]
fn test_malformed_input_is_reported_lazily() {
    let dir = TempDir::new().unwrap();
    let truncated = &CITIES[..CITIES.len() / 2];
    let source = write_input(&dir, "broken.geojson", truncated);

    let mut features = source.features().expect("opening does not parse");
    let first = features.next().expect("first feature");
    assert!(first.is_ok());

    let failure = features
        .find_map(Result::err)
        .expect("iteration must surface the error");
    assert!(failure.is_malformed_input());
    assert!(features.next().is_none());
}

/// Test that a missing file is an I/O error rather than malformed input
#[test]
fn test_missing_file() {
    let source = GeoJsonSource::new("/definitely/not/here.geojson");
    let Err(err) = source.features() else {
        panic!("expected an error");
    };
    assert!(matches!(err, ReadError::Io { .. }));
}

/// Test that parse errors carry the feature index
#[test]
fn test_parse_error_position() {
    let dir = TempDir::new().unwrap();
    let source = write_input(
        &dir,
        "bad.geojson",
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":null,"properties":{}},
            {"type":"Nope"}
        ]}"#,
    );

    let err = source
        .features()
        .unwrap()
        .find_map(Result::err)
        .expect("second feature is invalid");
    match err {
        ReadError::Parse { position, .. } => assert_eq!(position.record, Some(2)),
        ReadError::Io { .. } => panic!("Expected Parse error"),
    }
}

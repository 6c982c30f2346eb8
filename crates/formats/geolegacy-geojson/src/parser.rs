//! Decoding of a single GeoJSON feature chunk.
#![allow(clippy::result_large_err)]

use geo_types::Geometry;
use geojson::{Feature as GeoJsonFeature, Geometry as GeoJsonGeometry, JsonValue};
use geolegacy_core_common::{
    Feature, PropertyMap, PropertyValue, ReadError, ReadResult, SourcePosition,
};

/// Parse one element of the `features` array.
///
/// # Errors
///
/// Returns [`ReadError::Parse`] if the bytes are not JSON or not a GeoJSON
/// `Feature`; `geojson` rejects positions with fewer than two ordinates while
/// decoding the feature.
pub fn parse_feature(bytes: &[u8], position: &SourcePosition) -> ReadResult<Feature> {
    let value: JsonValue = serde_json::from_slice(bytes).map_err(|err| {
        ReadError::parse(
            format!("Failed to parse GeoJSON feature: {err}"),
            position.clone(),
        )
    })?;
    feature_from_value(value, position)
}

/// Converts one decoded element of the `features` array.
///
/// # Errors
///
/// Returns [`ReadError::Parse`] if the value is not a GeoJSON `Feature`.
pub fn feature_from_value(value: JsonValue, position: &SourcePosition) -> ReadResult<Feature> {
    let feature = GeoJsonFeature::try_from(value).map_err(|err| {
        ReadError::parse(format!("Not a GeoJSON Feature: {err}"), position.clone())
    })?;

    let geometry = match feature.geometry {
        Some(geometry) => Some(convert_geometry(geometry, position)?),
        None => None,
    };

    let properties: PropertyMap = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, PropertyValue::from(value)))
        .collect();

    Ok(Feature::new(geometry, properties))
}

fn convert_geometry(
    geometry: GeoJsonGeometry,
    position: &SourcePosition,
) -> ReadResult<Geometry<f64>> {
    geometry.try_into().map_err(|err| {
        ReadError::parse(
            format!("Failed to convert GeoJSON geometry: {err}"),
            position.clone(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> ReadResult<Feature> {
        parse_feature(data, &SourcePosition::default())
    }

    #[test]
    fn parse_point_feature() {
        let feature = parse(
            br#"{"type":"Feature","geometry":{"type":"Point","coordinates":[10,20]},"properties":{"name":"A","n":1,"r":1.5,"b":true,"z":null}}"#,
        )
        .expect("parse");

        assert!(matches!(feature.geometry, Some(Geometry::Point(_))));
        assert_eq!(
            feature.property("name"),
            Some(&PropertyValue::Text("A".to_string()))
        );
        assert_eq!(feature.property("n"), Some(&PropertyValue::Integer(1)));
        assert_eq!(feature.property("r"), Some(&PropertyValue::Real(1.5)));
        assert_eq!(feature.property("b"), Some(&PropertyValue::Boolean(true)));
        assert_eq!(feature.property("z"), Some(&PropertyValue::Null));
    }

    #[test]
    fn property_order_is_preserved() {
        let feature = parse(
            br#"{"type":"Feature","geometry":null,"properties":{"zeta":1,"alpha":2,"mid":3}}"#,
        )
        .expect("parse");
        let keys: Vec<&str> = feature.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn null_geometry_and_properties() {
        let feature =
            parse(br#"{"type":"Feature","geometry":null,"properties":null}"#).expect("parse");
        assert!(feature.geometry.is_none());
        assert!(feature.properties.is_empty());
    }

    #[test]
    fn geometry_collection_is_kept() {
        let feature = parse(
            br#"{"type":"Feature","geometry":{"type":"GeometryCollection","geometries":[]},"properties":{}}"#,
        )
        .expect("parse");
        assert!(matches!(
            feature.geometry,
            Some(Geometry::GeometryCollection(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse(b"{not json}").unwrap_err();
        assert!(err.to_string().contains("Failed to parse GeoJSON feature"));
    }

    #[test]
    fn rejects_non_feature_objects() {
        let err = parse(br#"{"type":"Point","coordinates":[0,0]}"#).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn rejects_short_positions() {
        let err = parse(
            br#"{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1]]},"properties":{}}"#,
        )
        .unwrap_err();
        assert!(err.is_malformed_input());

        let err = parse(
            br#"{"type":"Feature","geometry":{"type":"Point","coordinates":[3]},"properties":{}}"#,
        )
        .unwrap_err();
        assert!(err.is_malformed_input());
    }
}

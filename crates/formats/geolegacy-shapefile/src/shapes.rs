//! Conversion from `geo_types` geometries to shapefile records.

use geo_types::{Geometry, LineString};
use geolegacy_core_common::{GeometryFamily, SkipReason, geometry_type_name};
use shapefile::{Multipoint, Point, Polygon, PolygonRing, Polyline, ShapeType};

/// A shape ready to be written, tagged with its concrete record type.
#[derive(Debug, Clone, PartialEq)]
pub enum EsriShape {
    Point(Point),
    Multipoint(Multipoint),
    Polyline(Polyline),
    Polygon(Polygon),
}

#[must_use]
pub fn shape_type_for(family: GeometryFamily) -> ShapeType {
    match family {
        GeometryFamily::Point => ShapeType::Point,
        GeometryFamily::MultiPoint => ShapeType::Multipoint,
        GeometryFamily::LineString => ShapeType::Polyline,
        GeometryFamily::Polygon => ShapeType::Polygon,
    }
}

/// Builds the shape for `geometry` in a layer of `family`.
///
/// Multi-part lines and polygons are accepted and written as one record with
/// several parts.
///
/// # Errors
///
/// Returns a [`SkipReason`] when the geometry belongs to another family or is
/// degenerate (lines under 2 points, rings under 4 points, empty sets).
pub fn to_shape(geometry: &Geometry<f64>, family: GeometryFamily) -> Result<EsriShape, SkipReason> {
    if GeometryFamily::of(geometry) != Some(family) {
        return Err(SkipReason::GeometryMismatch {
            found: geometry_type_name(geometry),
            target: family.as_str(),
        });
    }

    match geometry {
        Geometry::Point(point) => Ok(EsriShape::Point(Point::new(point.x(), point.y()))),
        Geometry::MultiPoint(points) => {
            if points.0.is_empty() {
                return Err(SkipReason::InvalidGeometry("empty MultiPoint".to_string()));
            }
            let points = points.iter().map(|p| Point::new(p.x(), p.y())).collect();
            Ok(EsriShape::Multipoint(Multipoint::new(points)))
        },
        Geometry::LineString(line) => Ok(EsriShape::Polyline(Polyline::new(line_points(line)?))),
        Geometry::MultiLineString(lines) => {
            let parts = lines
                .iter()
                .map(line_points)
                .collect::<Result<Vec<_>, _>>()?;
            if parts.is_empty() {
                return Err(SkipReason::InvalidGeometry(
                    "empty MultiLineString".to_string(),
                ));
            }
            Ok(EsriShape::Polyline(Polyline::with_parts(parts)))
        },
        Geometry::Polygon(polygon) => {
            let mut rings = Vec::new();
            push_rings(polygon, &mut rings)?;
            Ok(EsriShape::Polygon(Polygon::with_rings(rings)))
        },
        Geometry::MultiPolygon(polygons) => {
            let mut rings = Vec::new();
            for polygon in polygons {
                push_rings(polygon, &mut rings)?;
            }
            if rings.is_empty() {
                return Err(SkipReason::InvalidGeometry("empty MultiPolygon".to_string()));
            }
            Ok(EsriShape::Polygon(Polygon::with_rings(rings)))
        },
        // GeometryFamily::of has no family for the remaining kinds
        other => Err(SkipReason::GeometryMismatch {
            found: geometry_type_name(other),
            target: family.as_str(),
        }),
    }
}

fn line_points(line: &LineString<f64>) -> Result<Vec<Point>, SkipReason> {
    if line.0.len() < 2 {
        return Err(SkipReason::InvalidGeometry(format!(
            "LineString with {} point(s)",
            line.0.len()
        )));
    }
    Ok(to_points(line))
}

fn push_rings(
    polygon: &geo_types::Polygon<f64>,
    rings: &mut Vec<PolygonRing<Point>>,
) -> Result<(), SkipReason> {
    let exterior = polygon.exterior();
    check_ring(exterior)?;
    rings.push(PolygonRing::Outer(to_points(exterior)));
    for interior in polygon.interiors() {
        check_ring(interior)?;
        rings.push(PolygonRing::Inner(to_points(interior)));
    }
    Ok(())
}

fn check_ring(ring: &LineString<f64>) -> Result<(), SkipReason> {
    if ring.0.len() < 4 {
        return Err(SkipReason::InvalidGeometry(format!(
            "polygon ring with {} point(s)",
            ring.0.len()
        )));
    }
    Ok(())
}

fn to_points(line: &LineString<f64>) -> Vec<Point> {
    line.coords().map(|c| Point::new(c.x, c.y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{MultiPolygon, polygon};

    fn square(offset: f64) -> geo_types::Polygon<f64> {
        polygon![
            (x: offset, y: 0.0),
            (x: offset + 1.0, y: 0.0),
            (x: offset + 1.0, y: 1.0),
            (x: offset, y: 1.0),
        ]
    }

    #[test]
    fn point_in_point_layer() {
        let shape = to_shape(
            &Geometry::Point(geo_types::Point::new(1.0, 2.0)),
            GeometryFamily::Point,
        )
        .unwrap();
        assert_eq!(shape, EsriShape::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn polygon_in_point_layer_is_mismatch() {
        let err = to_shape(&Geometry::Polygon(square(0.0)), GeometryFamily::Point).unwrap_err();
        assert_eq!(
            err,
            SkipReason::GeometryMismatch {
                found: "Polygon",
                target: "Point"
            }
        );
    }

    #[test]
    fn short_line_is_invalid() {
        let line = LineString::from(vec![(0.0, 0.0)]);
        let err = to_shape(&Geometry::LineString(line), GeometryFamily::LineString).unwrap_err();
        assert!(matches!(err, SkipReason::InvalidGeometry(_)));
    }

    #[test]
    fn multipolygon_becomes_multi_ring_polygon() {
        let multi = Geometry::MultiPolygon(MultiPolygon(vec![square(0.0), square(5.0)]));
        let EsriShape::Polygon(shape) = to_shape(&multi, GeometryFamily::Polygon).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(shape.rings().len(), 2);
    }

    #[test]
    fn shape_types() {
        assert_eq!(shape_type_for(GeometryFamily::Point), ShapeType::Point);
        assert_eq!(shape_type_for(GeometryFamily::Polygon), ShapeType::Polygon);
    }
}

//! Feature-level data model.
//!
//! Geometries are carried as [`geo_types::Geometry`], the representation the
//! `geojson` crate converts into. Properties are an ordered map of dynamically
//! typed [`PropertyValue`]s shared behind an [`Arc`] so that flattened parts of a
//! multi-geometry can point at the same record.

use std::fmt;
use std::sync::Arc;

use geo_types::Geometry;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// A single attribute value as found in the input.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl PropertyValue {
    /// Returns `true` for [`PropertyValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value. Booleans coerce to `0`/`1`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Boolean(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    /// Real view of the value. Integers and booleans widen to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            Self::Boolean(value) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text view of the value, `None` only for null.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
            Self::Boolean(value) => Some(value.to_string()),
        }
    }

    /// Short name of the variant, used in log messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl From<&JsonValue> for PropertyValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                // u64 beyond i64::MAX and all fractional numbers
                None => n.as_f64().map_or(Self::Null, Self::Real),
            },
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<JsonValue> for PropertyValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => Self::Text(s),
            other => Self::from(&other),
        }
    }
}

/// Ordered mapping from property key to value.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// One geometry plus its attribute record.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Arc<PropertyMap>,
}

impl Feature {
    #[must_use]
    pub fn new(geometry: Option<Geometry<f64>>, properties: PropertyMap) -> Self {
        Self {
            geometry,
            properties: Arc::new(properties),
        }
    }

    /// A feature sharing `properties` with its siblings.
    #[must_use]
    pub fn with_shared_properties(geometry: Geometry<f64>, properties: Arc<PropertyMap>) -> Self {
        Self {
            geometry: Some(geometry),
            properties,
        }
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geom = self.geometry.as_ref().map_or("None", geometry_type_name);
        write!(
            f,
            "Feature(properties={} keys, geometry={geom})",
            self.properties.len()
        )
    }
}

/// The single shape family every output geometry must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    Point,
    MultiPoint,
    LineString,
    Polygon,
}

impl GeometryFamily {
    /// Projects a geometry onto its output family.
    ///
    /// `MultiPolygon` and `MultiLineString` project onto their single
    /// counterparts because they are flattened before writing. Geometry kinds
    /// with no output mapping return `None`.
    #[must_use]
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(_) => Some(Self::Point),
            Geometry::MultiPoint(_) => Some(Self::MultiPoint),
            Geometry::LineString(_) | Geometry::MultiLineString(_) => Some(Self::LineString),
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Some(Self::Polygon),
            Geometry::Line(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_)
            | Geometry::GeometryCollection(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GeometryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GeoJSON-style name of a geometry's own type.
#[must_use]
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a
/// character.
#[must_use]
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

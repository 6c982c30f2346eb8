//! Geometry normalization.
//!
//! One conversion writes a single geometry family. The family is taken from the
//! first geometry-bearing feature; afterwards every feature is either expanded
//! into features of that family or skipped.

use std::sync::Arc;

use geo_types::Geometry;
use geolegacy_core_common::{
    Feature, GeometryFamily, PropertyMap, ReadResult, SkipReason, geometry_type_name,
};
use geozero::ToWkt;

use crate::error::{ConversionError, Result};

/// Chooses the output family for a conversion from its first geometry.
///
/// # Errors
///
/// Returns [`ConversionError::UnsupportedGeometry`] for geometry kinds with no
/// output mapping, such as a `GeometryCollection`.
pub fn select_target_family(geometry: &Geometry<f64>) -> Result<GeometryFamily> {
    GeometryFamily::of(geometry).ok_or_else(|| ConversionError::UnsupportedGeometry {
        geometry_type: geometry_type_name(geometry).to_string(),
    })
}

/// Outcome of normalizing one feature.
#[derive(Debug, Clone)]
pub enum Normalized {
    /// Zero or more features of the target family, in input order
    Parts(Vec<Feature>),
    Skipped(SkipReason),
}

/// Expands `feature` into features of the `target` family.
///
/// `MultiPolygon` and `MultiLineString` are flattened into one feature per
/// member; every part shares the original property map. Geometries of another
/// family are skipped.
#[must_use]
pub fn normalize(feature: Feature, target: GeometryFamily) -> Normalized {
    let Feature {
        geometry,
        properties,
    } = feature;
    let Some(geometry) = geometry else {
        return Normalized::Skipped(SkipReason::MissingGeometry);
    };
    if GeometryFamily::of(&geometry) != Some(target) {
        return Normalized::Skipped(SkipReason::GeometryMismatch {
            found: geometry_type_name(&geometry),
            target: target.as_str(),
        });
    }

    let parts = match geometry {
        Geometry::MultiPolygon(polygons) => polygons
            .0
            .into_iter()
            .map(|polygon| share(Geometry::Polygon(polygon), &properties))
            .collect(),
        Geometry::MultiLineString(lines) => lines
            .0
            .into_iter()
            .map(|line| share(Geometry::LineString(line), &properties))
            .collect(),
        other => vec![Feature::with_shared_properties(other, properties)],
    };
    Normalized::Parts(parts)
}

fn share(geometry: Geometry<f64>, properties: &Arc<PropertyMap>) -> Feature {
    Feature::with_shared_properties(geometry, Arc::clone(properties))
}

/// Counters collected while normalizing a feature sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Features read from the input
    pub features_read: u64,
    /// Features without geometry, excluded silently
    pub without_geometry: u64,
    /// Features dropped because their geometry does not fit the target family
    pub skipped: u64,
    /// Features produced, counting every flattened part
    pub parts: u64,
}

/// Iterator adapter applying [`normalize`] to a feature sequence.
///
/// Features without geometry are dropped silently, mismatching ones with a
/// warning. Read errors are passed through unchanged.
pub struct NormalizedFeatures<I> {
    inner: I,
    target: GeometryFamily,
    pending: std::vec::IntoIter<Feature>,
    stats: NormalizeStats,
}

impl<I> NormalizedFeatures<I>
where
    I: Iterator<Item = ReadResult<Feature>>,
{
    pub fn new(inner: I, target: GeometryFamily) -> Self {
        Self {
            inner,
            target,
            pending: Vec::new().into_iter(),
            stats: NormalizeStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> NormalizeStats {
        self.stats
    }
}

impl<I> Iterator for NormalizedFeatures<I>
where
    I: Iterator<Item = ReadResult<Feature>>,
{
    type Item = ReadResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(part) = self.pending.next() {
                self.stats.parts += 1;
                return Some(Ok(part));
            }

            let feature = match self.inner.next()? {
                Ok(feature) => feature,
                Err(err) => return Some(Err(err)),
            };
            self.stats.features_read += 1;
            let index = self.stats.features_read;

            let wkt = if log::log_enabled!(log::Level::Debug) {
                feature
                    .geometry
                    .as_ref()
                    .filter(|g| GeometryFamily::of(g) != Some(self.target))
                    .and_then(|g| g.to_wkt().ok())
            } else {
                None
            };

            match normalize(feature, self.target) {
                Normalized::Parts(parts) => self.pending = parts.into_iter(),
                Normalized::Skipped(SkipReason::MissingGeometry) => {
                    self.stats.without_geometry += 1;
                },
                Normalized::Skipped(reason) => {
                    self.stats.skipped += 1;
                    log::warn!("Skipping feature {index}: {reason}");
                    if let Some(wkt) = wkt {
                        log::debug!("Skipped geometry: {wkt}");
                    }
                },
            }
        }
    }
}

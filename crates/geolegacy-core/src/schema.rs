//! Streaming schema inference (pass 1).

use geolegacy_core_common::{
    Feature, FieldKind, GeometryFamily, ReadResult, Schema, geometry_type_name,
};

use crate::error::{ConversionError, Result};
use crate::normalize::select_target_family;

/// Result of one inference pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredSchema {
    /// Unified property schema in first-seen key order
    pub schema: Schema,
    /// Output family chosen from the first geometry-bearing feature
    pub family: GeometryFamily,
    /// Every feature read, including those without geometry
    pub features_seen: u64,
    /// Features that took part in inference
    pub features_with_geometry: u64,
}

/// Folds features into a unified schema one at a time.
///
/// Only features carrying a geometry are observed. Key kinds are joined with
/// [`FieldKind::promote`], so the result does not depend on feature order; key
/// order is the order in which keys are first seen with a non-null value.
#[derive(Debug, Default)]
pub struct SchemaInferrer {
    schema: Schema,
    family: Option<GeometryFamily>,
    features_seen: u64,
    features_with_geometry: u64,
}

impl SchemaInferrer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes one feature.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::UnsupportedGeometry`] when the first
    /// geometry-bearing feature has no output family.
    pub fn observe(&mut self, feature: &Feature) -> Result<()> {
        self.features_seen += 1;
        let Some(geometry) = feature.geometry.as_ref() else {
            return Ok(());
        };
        self.features_with_geometry += 1;

        if self.family.is_none() {
            let family = select_target_family(geometry)?;
            log::debug!(
                "Target family {family} chosen from {} at feature {}",
                geometry_type_name(geometry),
                self.features_seen
            );
            self.family = Some(family);
        }

        for (key, value) in feature.properties.iter() {
            if let Some(kind) = FieldKind::of_value(value) {
                self.schema.observe(key, kind);
            }
        }
        Ok(())
    }

    /// Completes inference.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NoGeometry`] if no observed feature carried
    /// a geometry.
    pub fn finish(self) -> Result<InferredSchema> {
        let family = self.family.ok_or(ConversionError::NoGeometry)?;
        Ok(InferredSchema {
            schema: self.schema,
            family,
            features_seen: self.features_seen,
            features_with_geometry: self.features_with_geometry,
        })
    }
}

/// Runs a full inference pass over `features`.
///
/// # Errors
///
/// Propagates read errors from the sequence, and the errors of
/// [`SchemaInferrer::observe`] and [`SchemaInferrer::finish`].
pub fn infer_schema<I>(features: I) -> Result<InferredSchema>
where
    I: IntoIterator<Item = ReadResult<Feature>>,
{
    let mut inferrer = SchemaInferrer::new();
    for feature in features {
        inferrer.observe(&feature?)?;
    }
    inferrer.finish()
}

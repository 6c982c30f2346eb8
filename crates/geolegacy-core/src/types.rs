//! Result types returned by conversion and inspection.

use std::path::PathBuf;

use geolegacy_core_common::{FieldKind, FieldNameMap, GeometryFamily, Schema};

use crate::drivers::OutputFormat;

/// Summary of a completed conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Output format written
    pub format: OutputFormat,
    /// Final locations of every artifact, in a stable order
    pub outputs: Vec<PathBuf>,
    /// Geometry family of the output layer
    pub family: GeometryFamily,
    /// Attribute schema of the output layer
    pub schema: Schema,
    /// Property key to column name mapping used for the output
    pub field_names: FieldNameMap,
    /// Features read during the writing pass
    pub features_read: u64,
    /// Records written to the output
    pub records_written: u64,
    /// Features dropped by normalization or rejected by the writer
    pub features_skipped: u64,
    /// Features excluded because they carry no geometry
    pub features_without_geometry: u64,
}

/// Schema preview produced without writing anything.
#[derive(Debug, Clone)]
pub struct InspectReport {
    /// Geometry family a conversion would write
    pub family: GeometryFamily,
    /// Unified attribute schema
    pub schema: Schema,
    /// Shapefile column names for each key
    pub shapefile_names: FieldNameMap,
    /// Every feature in the input
    pub features_seen: u64,
    /// Features carrying a geometry
    pub features_with_geometry: u64,
}

/// One row of an [`InspectReport`], flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Property key in the input
    pub key: String,
    /// Inferred column kind
    pub kind: FieldKind,
    /// Column name in a shapefile
    pub shapefile_name: String,
}

impl InspectReport {
    /// Fields in schema order.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldInfo> {
        self.schema
            .iter()
            .map(|(key, kind)| FieldInfo {
                key: key.to_string(),
                kind,
                shapefile_name: self.shapefile_names.get(key).unwrap_or(key).to_string(),
            })
            .collect()
    }
}

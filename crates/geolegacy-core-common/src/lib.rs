//! Common types and traits shared across `geolegacy` crates.
//!
//! This crate provides the data model and the reader/writer seams that are shared
//! between `geolegacy-core` and the format implementation crates, preventing
//! circular dependencies.

pub mod crs;
pub mod error;
pub mod io;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use error::{ReadError, ReadResult, SkipReason, SourcePosition, WriteError, WriteResult};
pub use io::{FeatureOutcome, FeatureSource, FeatureWriter, WriteSummary};
pub use schema::{ColumnSpec, FieldKind, FieldNameMap, LayerSpec, Schema};
pub use types::{
    Feature, GeometryFamily, PropertyMap, PropertyValue, geometry_type_name, truncate_utf8,
};

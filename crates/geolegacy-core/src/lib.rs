//! `geolegacy-core` converts streamed `GeoJSON` feature collections into legacy
//! single-layer containers.
//!
//! This crate includes:
//! - **Driver Registry**: the formats `geolegacy` reads and writes, and their capabilities.
//! - **Normalization**: choosing one output geometry family and flattening multi-part geometries.
//! - **Schema Inference**: a single streaming pass that unifies every feature's properties.
//! - **Field Names**: mapping property keys onto the identifiers an output format accepts.
//! - **Operations**: the two-pass conversion itself, in blocking and async flavours.
//!
//! ```no_run
//! use geolegacy_core::drivers::OutputFormat;
//! use geolegacy_core::operations::{ConvertOptions, convert_path};
//!
//! let options = ConvertOptions::new(OutputFormat::Shapefile, "out", "cities");
//! let report = convert_path("cities.geojson".as_ref(), &options)?;
//! println!("wrote {} record(s)", report.records_written);
//! # Ok::<(), geolegacy_core::error::ConversionError>(())
//! ```

pub mod drivers;
pub mod error;
pub mod field_names;
pub mod normalize;
pub mod operations;
pub mod schema;
pub mod types;

//! Streaming `GeoJSON` input for `geolegacy`.
//!
//! A `FeatureCollection` is read one feature at a time: the
//! [`splitter::FeatureSplitter`] pulls `actson` parser events and rebuilds one
//! element of the `features` array at a time, and
//! [`parser::feature_from_value`] turns each element into a feature with
//! `geojson`.
//! Memory use is bounded by the largest single feature, not the collection.
//!
//! ```no_run
//! use geolegacy_core_common::FeatureSource;
//! use geolegacy_geojson::GeoJsonSource;
//!
//! let source = GeoJsonSource::new("cities.geojson");
//! for feature in source.features()? {
//!     println!("{}", feature?);
//! }
//! # Ok::<(), geolegacy_core_common::ReadError>(())
//! ```

pub mod parser;
pub mod source;
pub mod splitter;

pub use parser::{feature_from_value, parse_feature};
pub use source::{FeatureSequence, GeoJsonSource};
pub use splitter::{FeatureSplitter, RawFeature};

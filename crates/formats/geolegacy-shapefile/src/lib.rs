//! ESRI Shapefile output for `geolegacy`.
//!
//! A layer is written as the usual `.shp`/`.shx`/`.dbf` triple plus a `.prj`
//! declaring WGS 84. Attribute columns follow the dBASE limits: names of at
//! most 10 bytes, numeric fields of fixed width and text of at most 254 bytes.

pub mod layout;
pub mod shapes;
pub mod writer;

pub use layout::{FieldLayout, layout_for};
pub use writer::ShapefileWriter;

/// Driver name as shown by `geolegacy drivers`.
pub const DRIVER_NAME: &str = "ESRI Shapefile";

/// Longest field name a `.dbf` header can hold.
pub const MAX_FIELD_NAME_BYTES: usize = 10;

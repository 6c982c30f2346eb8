//! OGC GeoPackage output for `geolegacy`.
//!
//! A layer is written as one feature table inside a single `.gpkg` SQLite
//! database, registered in the `gpkg_contents` and `gpkg_geometry_columns`
//! metadata tables with the WGS 84 spatial reference system.

pub mod binary;
pub mod ddl;
pub mod writer;

pub use binary::encode_geometry;
pub use writer::GeoPackageWriter;

/// Driver name as shown by `geolegacy drivers`.
pub const DRIVER_NAME: &str = "GPKG";

/// Primary key column of every feature table.
pub const FID_COLUMN: &str = "fid";

/// Geometry column of every feature table.
pub const GEOMETRY_COLUMN: &str = "geom";

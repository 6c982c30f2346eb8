//! GeoPackage binary geometry encoding.
//!
//! Blobs are written by `geozero`'s GeoPackage WKB dialect: the `GP` header
//! followed by standard little-endian WKB.
//!
//! ```text
//! magic "GP" | version 0 | flags | srs_id (i32) | envelope [minx, maxx, miny, maxy] | WKB
//! ```

use geo::BoundingRect;
use geo_types::Geometry;
use geolegacy_core_common::{WriteError, WriteResult};
use geozero::{CoordDimensions, ToWkb};

/// Encodes `geometry` as a GeoPackage geometry blob.
///
/// The header carries an XY envelope whenever the geometry has a bounding
/// rectangle.
///
/// # Errors
///
/// Returns [`WriteError::Encode`] if the WKB body cannot be produced.
pub fn encode_geometry(geometry: &Geometry<f64>, srs_id: i32) -> WriteResult<Vec<u8>> {
    let envelope = geometry
        .bounding_rect()
        .map(|rect| vec![rect.min().x, rect.max().x, rect.min().y, rect.max().y])
        .unwrap_or_default();

    geometry
        .to_gpkg_wkb(CoordDimensions::xy(), Some(srs_id), envelope)
        .map_err(|e| WriteError::Encode(e.to_string()))
}

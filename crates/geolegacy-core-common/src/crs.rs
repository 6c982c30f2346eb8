//! The fixed geographic coordinate reference system of every output.
//!
//! Outputs are always WGS 84 longitude/latitude; no reprojection happens.

/// ESRI-flavoured WKT written verbatim to the shapefile `.prj`.
pub const WGS84_PRJ: &str = concat!(
    r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984","#,
    r#"SPHEROID["WGS_1984",6378137,298.257223563]],"#,
    r#"PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#,
);

/// EPSG code of WGS 84, used as the GeoPackage `srs_id`.
pub const WGS84_SRS_ID: i32 = 4326;

pub const WGS84_SRS_NAME: &str = "WGS 84 geodetic";

/// OGC WKT stored in `gpkg_spatial_ref_sys.definition`.
pub const WGS84_OGC_WKT: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984","#,
    r#"SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],"#,
    r#"AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
    r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],"#,
    r#"AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#,
);

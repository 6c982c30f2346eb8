//! Schema statements for the GeoPackage metadata tables and the feature table.

use geolegacy_core_common::crs::{WGS84_OGC_WKT, WGS84_SRS_ID, WGS84_SRS_NAME};
use geolegacy_core_common::{FieldKind, GeometryFamily, LayerSpec};
use rusqlite::{Connection, params};

use crate::{FID_COLUMN, GEOMETRY_COLUMN};

/// `PRAGMA application_id` value: ASCII "GPKG".
pub const APPLICATION_ID: i32 = 0x4750_4B47;

/// `PRAGMA user_version` value for GeoPackage 1.3.
pub const USER_VERSION: i32 = 10300;

const CREATE_SPATIAL_REF_SYS: &str = "CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
)";

const CREATE_CONTENTS: &str = "CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
)";

const CREATE_GEOMETRY_COLUMNS: &str = "CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT uk_gc_table_name UNIQUE (table_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
)";

const INSERT_SRS: &str = "INSERT INTO gpkg_spatial_ref_sys
    (srs_name, srs_id, organization, organization_coordsys_id, definition, description)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// Stamps the GeoPackage pragmas and creates the mandatory metadata tables.
///
/// # Errors
///
/// Returns the SQLite error of the first failing statement.
pub fn create_metadata(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    conn.pragma_update(None, "user_version", USER_VERSION)?;

    conn.execute(CREATE_SPATIAL_REF_SYS, [])?;
    conn.execute(CREATE_CONTENTS, [])?;
    conn.execute(CREATE_GEOMETRY_COLUMNS, [])?;

    conn.execute(
        INSERT_SRS,
        params![
            "Undefined cartesian SRS",
            -1,
            "NONE",
            -1,
            "undefined",
            "undefined cartesian coordinate reference system"
        ],
    )?;
    conn.execute(
        INSERT_SRS,
        params![
            "Undefined geographic SRS",
            0,
            "NONE",
            0,
            "undefined",
            "undefined geographic coordinate reference system"
        ],
    )?;
    conn.execute(
        INSERT_SRS,
        params![
            WGS84_SRS_NAME,
            WGS84_SRS_ID,
            "EPSG",
            WGS84_SRS_ID,
            WGS84_OGC_WKT,
            "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid"
        ],
    )?;
    Ok(())
}

/// Creates the feature table for `spec` and registers it in the metadata
/// tables.
///
/// # Errors
///
/// Returns the SQLite error of the first failing statement.
pub fn create_feature_table(conn: &Connection, spec: &LayerSpec) -> rusqlite::Result<()> {
    conn.execute(&create_table_sql(spec), [])?;
    conn.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
         VALUES (?1, 'features', ?1, ?2)",
        params![spec.name, WGS84_SRS_ID],
    )?;
    conn.execute(
        "INSERT INTO gpkg_geometry_columns
         (table_name, column_name, geometry_type_name, srs_id, z, m)
         VALUES (?1, ?2, ?3, ?4, 0, 0)",
        params![
            spec.name,
            GEOMETRY_COLUMN,
            geometry_type_name(spec.family),
            WGS84_SRS_ID
        ],
    )?;
    Ok(())
}

/// Records the layer extent in `gpkg_contents`.
///
/// # Errors
///
/// Returns the SQLite error if the update fails.
pub fn update_extent(
    conn: &Connection,
    table: &str,
    [min_x, min_y, max_x, max_y]: [f64; 4],
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE gpkg_contents SET min_x = ?2, min_y = ?3, max_x = ?4, max_y = ?5,
         last_change = strftime('%Y-%m-%dT%H:%M:%fZ','now')
         WHERE table_name = ?1",
        params![table, min_x, min_y, max_x, max_y],
    )?;
    Ok(())
}

/// `CREATE TABLE` statement for the feature table.
#[must_use]
pub fn create_table_sql(spec: &LayerSpec) -> String {
    let mut columns = vec![
        format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL",
            quote_identifier(FID_COLUMN)
        ),
        format!(
            "{} {}",
            quote_identifier(GEOMETRY_COLUMN),
            geometry_type_name(spec.family)
        ),
    ];
    columns.extend(spec.columns.iter().map(|column| {
        format!(
            "{} {}",
            quote_identifier(&column.name),
            column_type(column.kind)
        )
    }));
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&spec.name),
        columns.join(", ")
    )
}

/// `INSERT` statement with one positional parameter per column, geometry
/// first.
#[must_use]
pub fn insert_sql(spec: &LayerSpec) -> String {
    let names: Vec<String> = std::iter::once(GEOMETRY_COLUMN)
        .chain(spec.columns.iter().map(|c| c.name.as_str()))
        .map(quote_identifier)
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(&spec.name),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Double-quotes an SQL identifier.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[must_use]
pub fn geometry_type_name(family: GeometryFamily) -> &'static str {
    match family {
        GeometryFamily::Point => "POINT",
        GeometryFamily::MultiPoint => "MULTIPOINT",
        GeometryFamily::LineString => "LINESTRING",
        GeometryFamily::Polygon => "POLYGON",
    }
}

fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "INTEGER",
        FieldKind::Real => "REAL",
        FieldKind::Text => "TEXT",
    }
}

//! Streaming GeoPackage writer.

use std::path::{Path, PathBuf};

use geo::BoundingRect;
use geo_types::{Geometry, LineString, Rect, coord};
use geolegacy_core_common::crs::WGS84_SRS_ID;
use geolegacy_core_common::{
    Feature, FeatureOutcome, FeatureWriter, FieldKind, GeometryFamily, LayerSpec, PropertyValue,
    SkipReason, WriteError, WriteResult, WriteSummary, geometry_type_name,
};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::binary::encode_geometry;
use crate::ddl;

const FORMAT: &str = "GPKG";

/// Writes one feature table into a new `.gpkg` file.
///
/// Every insert runs inside a single transaction that is committed by
/// [`FeatureWriter::finish`]. Dropping the writer without finishing leaves the
/// transaction uncommitted.
pub struct GeoPackageWriter {
    path: PathBuf,
    spec: LayerSpec,
    conn: Connection,
    insert_sql: String,
    extent: Option<Rect<f64>>,
    records: u64,
}

impl GeoPackageWriter {
    /// Creates `path` and the feature table described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists or any schema statement
    /// fails.
    pub fn create(path: &Path, spec: LayerSpec) -> WriteResult<Self> {
        if path.exists() {
            return Err(WriteError::Create {
                format: FORMAT,
                path: path.to_path_buf(),
                message: "file already exists".to_string(),
            });
        }

        let conn = Connection::open(path).map_err(|e| WriteError::Create {
            format: FORMAT,
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let sqlite = |e: rusqlite::Error| WriteError::Sqlite {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        ddl::create_metadata(&conn).map_err(sqlite)?;
        conn.execute_batch("BEGIN").map_err(sqlite)?;
        ddl::create_feature_table(&conn, &spec).map_err(sqlite)?;

        log::debug!(
            "Created GeoPackage {} with layer '{}' ({}, {} field(s))",
            path.display(),
            spec.name,
            ddl::geometry_type_name(spec.family),
            spec.columns.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            insert_sql: ddl::insert_sql(&spec),
            spec,
            conn,
            extent: None,
            records: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn row_values(&self, blob: Vec<u8>, feature: &Feature) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.spec.columns.len() + 1);
        values.push(Value::Blob(blob));
        for column in &self.spec.columns {
            let value = feature
                .property(&column.key)
                .unwrap_or(&PropertyValue::Null);
            values.push(column_value(column.kind, value));
        }
        values
    }

    fn sqlite_error(&self, e: &rusqlite::Error) -> WriteError {
        WriteError::Sqlite {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }

    fn grow_extent(&mut self, geometry: &Geometry<f64>) {
        let Some(rect) = geometry.bounding_rect() else {
            return;
        };
        self.extent = Some(match self.extent {
            None => rect,
            Some(current) => Rect::new(
                coord! {
                    x: current.min().x.min(rect.min().x),
                    y: current.min().y.min(rect.min().y),
                },
                coord! {
                    x: current.max().x.max(rect.max().x),
                    y: current.max().y.max(rect.max().y),
                },
            ),
        });
    }
}

impl FeatureWriter for GeoPackageWriter {
    fn write_feature(&mut self, feature: &Feature) -> WriteResult<FeatureOutcome> {
        let Some(geometry) = feature.geometry.as_ref() else {
            return Ok(FeatureOutcome::Skipped(SkipReason::MissingGeometry));
        };
        if let Err(reason) = check_geometry(geometry, self.spec.family) {
            return Ok(FeatureOutcome::Skipped(reason));
        }

        let blob = match encode_blob(geometry) {
            Ok(blob) => blob,
            Err(reason) => return Ok(FeatureOutcome::Skipped(reason)),
        };
        let values = self.row_values(blob, feature);

        let inserted = {
            let mut stmt = self
                .conn
                .prepare_cached(&self.insert_sql)
                .map_err(|e| self.sqlite_error(&e))?;
            stmt.execute(params_from_iter(values))
        };
        match inserted {
            Ok(_) => {
                self.grow_extent(geometry);
                self.records += 1;
                Ok(FeatureOutcome::Written)
            },
            // A failed statement is rolled back on its own; the transaction
            // stays usable for the following rows.
            Err(e) => Ok(FeatureOutcome::Skipped(SkipReason::RecordRejected(
                e.to_string(),
            ))),
        }
    }

    fn finish(self: Box<Self>) -> WriteResult<WriteSummary> {
        if let Some(rect) = self.extent {
            ddl::update_extent(
                &self.conn,
                &self.spec.name,
                [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
            )
            .map_err(|e| self.sqlite_error(&e))?;
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| self.sqlite_error(&e))?;

        let Self { path, conn, records, .. } = *self;
        conn.close().map_err(|(_, e)| WriteError::Finalize {
            format: FORMAT,
            path: path.clone(),
            message: e.to_string(),
        })?;

        log::debug!("Closed {} with {records} record(s)", path.display());
        Ok(WriteSummary {
            files: vec![path],
            records,
        })
    }
}

/// Encodes the geometry column value. A geometry that cannot be encoded only
/// costs its own row.
fn encode_blob(geometry: &Geometry<f64>) -> Result<Vec<u8>, SkipReason> {
    encode_geometry(geometry, WGS84_SRS_ID).map_err(reject_encoding)
}

fn reject_encoding(error: WriteError) -> SkipReason {
    SkipReason::RecordRejected(error.to_string())
}

/// Checks that `geometry` can be stored in a column of `family`.
///
/// GeoPackage geometry columns are typed, so the geometry's own type has to
/// be the family itself; multi-part lines and polygons are not accepted.
fn check_geometry(geometry: &Geometry<f64>, family: GeometryFamily) -> Result<(), SkipReason> {
    let mismatch = || SkipReason::GeometryMismatch {
        found: geometry_type_name(geometry),
        target: family.as_str(),
    };
    match (geometry, family) {
        (Geometry::Point(_), GeometryFamily::Point) => Ok(()),
        (Geometry::MultiPoint(points), GeometryFamily::MultiPoint) => {
            if points.0.is_empty() {
                Err(SkipReason::InvalidGeometry("empty MultiPoint".to_string()))
            } else {
                Ok(())
            }
        },
        (Geometry::LineString(line), GeometryFamily::LineString) => {
            if line.0.len() < 2 {
                Err(SkipReason::InvalidGeometry(format!(
                    "LineString with {} point(s)",
                    line.0.len()
                )))
            } else {
                Ok(())
            }
        },
        (Geometry::Polygon(polygon), GeometryFamily::Polygon) => {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .try_for_each(check_ring)
        },
        _ => Err(mismatch()),
    }
}

fn check_ring(ring: &LineString<f64>) -> Result<(), SkipReason> {
    if ring.0.len() < 4 {
        return Err(SkipReason::InvalidGeometry(format!(
            "polygon ring with {} point(s)",
            ring.0.len()
        )));
    }
    Ok(())
}

fn column_value(kind: FieldKind, value: &PropertyValue) -> Value {
    let converted = match kind {
        FieldKind::Integer => value.as_integer().map(Value::Integer),
        FieldKind::Real => value.as_real().map(Value::Real),
        FieldKind::Text => value.to_text().map(Value::Text),
    };
    converted.unwrap_or(Value::Null)
}

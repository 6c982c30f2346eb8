//! Streaming shapefile writer.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use geolegacy_core_common::crs::WGS84_PRJ;
use geolegacy_core_common::{
    Feature, FeatureOutcome, FeatureWriter, LayerSpec, SkipReason, WriteError, WriteResult,
    WriteSummary,
};
use shapefile::Writer;
use shapefile::dbase::{FieldName, Record, TableWriterBuilder};

use crate::layout::{FieldLayout, fit_value, layout_for};
use crate::shapes::{EsriShape, shape_type_for, to_shape};

const FORMAT: &str = "ESRI Shapefile";

/// Writes one layer as `<name>.shp`, `<name>.shx`, `<name>.dbf` and
/// `<name>.prj` inside a directory.
pub struct ShapefileWriter {
    shp_path: PathBuf,
    spec: LayerSpec,
    writer: Writer<BufWriter<File>>,
    records: u64,
}

impl ShapefileWriter {
    /// Creates the output files for `spec` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name is not a valid dBASE field name or the
    /// files cannot be created.
    pub fn create(dir: &Path, spec: LayerSpec) -> WriteResult<Self> {
        let shp_path = dir.join(format!("{}.shp", spec.name));
        let table = table_builder(&spec, &shp_path)?;
        let writer = Writer::from_path(&shp_path, table).map_err(|e| WriteError::Create {
            format: FORMAT,
            path: shp_path.clone(),
            message: e.to_string(),
        })?;

        log::debug!(
            "Created {:?} shapefile {} with {} field(s)",
            shape_type_for(spec.family),
            shp_path.display(),
            spec.columns.len()
        );

        Ok(Self {
            shp_path,
            spec,
            writer,
            records: 0,
        })
    }

    /// Path of the `.shp` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.shp_path
    }

    fn prepare(&self, feature: &Feature) -> Result<(EsriShape, Record), SkipReason> {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(SkipReason::MissingGeometry)?;
        let shape = to_shape(geometry, self.spec.family)?;

        let mut record = Record::default();
        for column in &self.spec.columns {
            let value = fit_value(column, feature.property(&column.key))?;
            record.insert(column.name.clone(), value);
        }
        Ok((shape, record))
    }

    fn write_prepared(&mut self, shape: &EsriShape, record: &Record) -> WriteResult<()> {
        let result = match shape {
            EsriShape::Point(s) => self.writer.write_shape_and_record(s, record),
            EsriShape::Multipoint(s) => self.writer.write_shape_and_record(s, record),
            EsriShape::Polyline(s) => self.writer.write_shape_and_record(s, record),
            EsriShape::Polygon(s) => self.writer.write_shape_and_record(s, record),
        };
        result.map_err(|e| WriteError::Shapefile {
            path: self.shp_path.clone(),
            message: e.to_string(),
        })
    }
}

impl FeatureWriter for ShapefileWriter {
    fn write_feature(&mut self, feature: &Feature) -> WriteResult<FeatureOutcome> {
        // Everything that could be rejected is checked before any byte is
        // written, so a skipped feature never leaves a partial record behind.
        let (shape, record) = match self.prepare(feature) {
            Ok(prepared) => prepared,
            Err(reason) => return Ok(FeatureOutcome::Skipped(reason)),
        };
        self.write_prepared(&shape, &record)?;
        self.records += 1;
        Ok(FeatureOutcome::Written)
    }

    fn finish(self: Box<Self>) -> WriteResult<WriteSummary> {
        let Self {
            shp_path,
            writer,
            records,
            ..
        } = *self;

        // Headers of .shp, .shx and .dbf are completed when the writer drops
        drop(writer);

        let prj_path = shp_path.with_extension("prj");
        fs::write(&prj_path, WGS84_PRJ).map_err(|source| WriteError::Io {
            path: prj_path.clone(),
            source,
        })?;

        let files = vec![
            shp_path.clone(),
            shp_path.with_extension("shx"),
            shp_path.with_extension("dbf"),
            prj_path,
        ];
        if let Some(missing) = files.iter().find(|path| !path.exists()) {
            return Err(WriteError::Finalize {
                format: FORMAT,
                path: shp_path.clone(),
                message: format!("'{}' was not written", missing.display()),
            });
        }

        log::debug!("Closed {} with {records} record(s)", shp_path.display());
        Ok(WriteSummary { files, records })
    }
}

fn table_builder(spec: &LayerSpec, shp_path: &Path) -> WriteResult<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for column in &spec.columns {
        let name = FieldName::try_from(column.name.as_str()).map_err(|e| WriteError::Create {
            format: FORMAT,
            path: shp_path.to_path_buf(),
            message: format!("invalid field name '{}': {e:?}", column.name),
        })?;
        builder = match layout_for(column.kind) {
            FieldLayout::Numeric { width, decimals } => {
                builder.add_numeric_field(name, width, decimals)
            },
            FieldLayout::Character { width } => builder.add_character_field(name, width),
        };
    }
    Ok(builder)
}

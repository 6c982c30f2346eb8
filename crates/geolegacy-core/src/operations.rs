//! Two-pass conversion of a `GeoJSON` feature collection.
//!
//! Pass 1 infers the schema and the output geometry family; pass 2 normalizes
//! the features and streams them into a writer. Outputs are built in a scratch
//! directory inside the output directory and only moved into place once the
//! writer has been finalized, so a failed conversion leaves nothing behind.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use geolegacy_core_common::{
    FeatureOutcome, FeatureSource, FeatureWriter, LayerSpec, WriteSummary,
};
use geolegacy_geojson::GeoJsonSource;
use geolegacy_geopackage::GeoPackageWriter;
use geolegacy_shapefile::ShapefileWriter;
use log::{debug, info, warn};

use crate::drivers::OutputFormat;
use crate::error::{ConfigError, ConversionError, Result};
use crate::field_names::FieldNameResolver;
use crate::normalize::NormalizedFeatures;
use crate::schema::infer_schema;
use crate::types::{ConversionReport, InspectReport};

/// Options for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    format: OutputFormat,
    output_dir: PathBuf,
    name: String,
    layer_name: Option<String>,
}

impl ConvertOptions {
    /// Creates options writing `format` into `output_dir` under the base name
    /// `name`.
    pub fn new(format: OutputFormat, output_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            format,
            output_dir: output_dir.into(),
            name: name.into(),
            layer_name: None,
        }
    }

    /// Sets the GeoPackage table name. Defaults to the base name; ignored for
    /// shapefiles, whose layer is named after the files.
    #[must_use]
    pub fn with_layer_name(mut self, layer_name: impl Into<String>) -> Self {
        self.layer_name = Some(layer_name.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the layer inside the output.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        match self.format {
            OutputFormat::Shapefile => &self.name,
            OutputFormat::GeoPackage => self.layer_name.as_deref().unwrap_or(&self.name),
        }
    }

    /// Final paths of every artifact this conversion produces.
    #[must_use]
    pub fn output_paths(&self) -> Vec<PathBuf> {
        let extensions: &[&str] = match self.format {
            OutputFormat::Shapefile => &["shp", "shx", "dbf", "prj"],
            OutputFormat::GeoPackage => &["gpkg"],
        };
        extensions
            .iter()
            .map(|ext| self.output_dir.join(format!("{}.{ext}", self.name)))
            .collect()
    }

    /// Checks the base name and the layer name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] describing the first problem.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_output_name(&self.name)?;
        if self.format == OutputFormat::GeoPackage {
            validate_layer_name(self.layer_name())?;
        }
        Ok(())
    }
}

/// Checks that `name` is safe to use as the base name of output files.
///
/// The name must be non-empty and must not contain path separators, parent
/// directory sequences or NUL bytes.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] if the name is rejected.
pub fn validate_output_name(name: &str) -> std::result::Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidOption {
        option: "output name".to_string(),
        message: format!("'{name}' {message}"),
    };

    if name.trim().is_empty() {
        return Err(invalid("is empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    if name.contains('\0') {
        return Err(invalid("must not contain NUL bytes"));
    }
    Ok(())
}

fn validate_layer_name(layer: &str) -> std::result::Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidOption {
        option: "layer name".to_string(),
        message: format!("'{layer}' {message}"),
    };

    if layer.trim().is_empty() {
        return Err(invalid("is empty"));
    }
    let lower = layer.to_ascii_lowercase();
    if lower.starts_with("gpkg_") || lower.starts_with("sqlite_") || lower.starts_with("rtree_") {
        return Err(invalid("uses a prefix reserved for GeoPackage metadata tables"));
    }
    Ok(())
}

/// Resolver matching the column naming rules of `format`.
#[must_use]
pub fn field_name_resolver(format: OutputFormat) -> FieldNameResolver {
    match format {
        OutputFormat::Shapefile => FieldNameResolver::shapefile(),
        OutputFormat::GeoPackage => FieldNameResolver::geopackage(),
    }
}

/// Converts every feature of `source` according to `options`.
///
/// `source` is traversed twice; both traversals must observe the same
/// features.
///
/// # Errors
///
/// Returns an error if the options are invalid, the input is malformed or has
/// no usable geometry, or the output cannot be written. No output file is left
/// behind on error.
pub fn convert_source<S: FeatureSource>(
    source: &S,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    options.validate()?;
    info!("Starting conversion:");
    info!(
        "Output: {} (Driver: {})",
        options.output_dir.display(),
        options.format
    );
    prepare_output_dir(options)?;

    // Pass 1: schema and target family
    let inferred = infer_schema(source.features()?)?;
    info!(
        "Inferred {} field(s) and target family {} from {} feature(s)",
        inferred.schema.len(),
        inferred.family,
        inferred.features_seen
    );

    let field_names = field_name_resolver(options.format).resolve(inferred.schema.keys());
    let layer = LayerSpec::new(
        options.layer_name(),
        inferred.family,
        &inferred.schema,
        &field_names,
    );

    let scratch = tempfile::Builder::new()
        .prefix(".geolegacy-")
        .tempdir_in(&options.output_dir)
        .map_err(|e| {
            ConversionError::io(
                format!(
                    "creating a scratch directory in {}",
                    options.output_dir.display()
                ),
                e,
            )
        })?;
    debug!("Writing into scratch directory {}", scratch.path().display());

    // Pass 2: normalize and write
    let mut writer = create_writer(options, layer, scratch.path())?;
    let mut features = NormalizedFeatures::new(source.features()?, inferred.family);
    let mut rejected = 0u64;
    while let Some(feature) = features.next() {
        let feature = feature?;
        if let FeatureOutcome::Skipped(reason) = writer.write_feature(&feature)? {
            rejected += 1;
            warn!(
                "Skipping feature {}: {reason}",
                features.stats().features_read
            );
        }
    }
    let stats = features.stats();

    let WriteSummary { files, records } = writer.finish()?;
    let outputs = publish(&files, &options.output_dir)?;
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory: {e}");
    }

    let skipped = stats.skipped + rejected;
    if skipped > 0 {
        warn!("{skipped} feature(s) were skipped");
    }
    info!("Wrote {records} record(s) to {} file(s)", outputs.len());
    info!("Conversion completed successfully");

    Ok(ConversionReport {
        format: options.format,
        outputs,
        family: inferred.family,
        schema: inferred.schema,
        field_names,
        features_read: stats.features_read,
        records_written: records,
        features_skipped: skipped,
        features_without_geometry: stats.without_geometry,
    })
}

/// Converts a `GeoJSON` file on disk.
///
/// # Errors
///
/// See [`convert_source`].
pub fn convert_path(input: &Path, options: &ConvertOptions) -> Result<ConversionReport> {
    info!("Input: {} (Driver: GeoJSON)", input.display());
    convert_source(&GeoJsonSource::new(input), options)
}

/// Converts a single-use byte stream.
///
/// The stream is first copied to a temporary file so that both passes can
/// read it independently.
///
/// # Errors
///
/// Returns an error if the stream cannot be spooled, and otherwise the errors
/// of [`convert_source`].
pub fn convert_reader<R: Read>(mut reader: R, options: &ConvertOptions) -> Result<ConversionReport> {
    options.validate()?;

    let mut spool = tempfile::Builder::new()
        .prefix("geolegacy-input-")
        .suffix(".geojson")
        .tempfile()
        .map_err(|e| ConversionError::io("creating a temporary input file", e))?;
    let bytes = std::io::copy(&mut reader, &mut spool)
        .map_err(|e| ConversionError::io("spooling the input stream", e))?;
    debug!("Spooled {bytes} byte(s) to {}", spool.path().display());

    convert_source(&GeoJsonSource::new(spool.path()), options)
}

/// Converts a `GeoJSON` file on tokio's blocking pool.
///
/// # Errors
///
/// See [`convert_source`]; [`ConversionError::Task`] if the blocking task
/// panics.
pub async fn convert(input: impl Into<PathBuf>, options: ConvertOptions) -> Result<ConversionReport> {
    let input = input.into();
    tokio::task::spawn_blocking(move || convert_path(&input, &options))
        .await
        .map_err(|e| ConversionError::Task(e.to_string()))?
}

/// Converts a single-use byte stream on tokio's blocking pool.
///
/// # Errors
///
/// See [`convert_reader`].
pub async fn convert_stream<R>(reader: R, options: ConvertOptions) -> Result<ConversionReport>
where
    R: Read + Send + 'static,
{
    tokio::task::spawn_blocking(move || convert_reader(reader, &options))
        .await
        .map_err(|e| ConversionError::Task(e.to_string()))?
}

/// Runs the inference pass only.
///
/// # Errors
///
/// Returns an error if the input is malformed or has no usable geometry.
pub fn inspect<S: FeatureSource>(source: &S) -> Result<InspectReport> {
    let inferred = infer_schema(source.features()?)?;
    let shapefile_names = FieldNameResolver::shapefile().resolve(inferred.schema.keys());
    Ok(InspectReport {
        family: inferred.family,
        schema: inferred.schema,
        shapefile_names,
        features_seen: inferred.features_seen,
        features_with_geometry: inferred.features_with_geometry,
    })
}

/// Runs the inference pass over a `GeoJSON` file.
///
/// # Errors
///
/// See [`inspect`].
pub fn inspect_path(input: &Path) -> Result<InspectReport> {
    inspect(&GeoJsonSource::new(input))
}

fn prepare_output_dir(options: &ConvertOptions) -> Result<()> {
    fs::create_dir_all(&options.output_dir).map_err(|e| {
        ConversionError::io(
            format!("creating output directory {}", options.output_dir.display()),
            e,
        )
    })?;
    if let Some(existing) = options.output_paths().into_iter().find(|p| p.exists()) {
        return Err(ConfigError::InvalidOption {
            option: "output name".to_string(),
            message: format!("'{}' already exists", existing.display()),
        }
        .into());
    }
    Ok(())
}

fn create_writer(
    options: &ConvertOptions,
    layer: LayerSpec,
    scratch: &Path,
) -> Result<Box<dyn FeatureWriter>> {
    let writer: Box<dyn FeatureWriter> = match options.format {
        OutputFormat::Shapefile => Box::new(ShapefileWriter::create(scratch, layer)?),
        OutputFormat::GeoPackage => {
            let path = scratch.join(format!("{}.gpkg", options.name));
            Box::new(GeoPackageWriter::create(&path, layer)?)
        },
    };
    Ok(writer)
}

/// Moves finished artifacts from the scratch directory into `output_dir`.
///
/// Artifacts already moved are removed again if a later move fails.
fn publish(files: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut published: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        let target = match file.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.to_path_buf(),
        };
        if let Err(e) = fs::rename(file, &target) {
            for done in &published {
                if let Err(cleanup) = fs::remove_file(done) {
                    warn!("Failed to remove {}: {cleanup}", done.display());
                }
            }
            return Err(ConversionError::io(
                format!("moving {} into place", target.display()),
                e,
            ));
        }
        published.push(target);
    }
    Ok(published)
}

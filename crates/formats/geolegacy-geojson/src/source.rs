//! Restartable feature sequence backed by a file on disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use geolegacy_core_common::{Feature, FeatureSource, ReadError, ReadResult};

use crate::parser::feature_from_value;
use crate::splitter::FeatureSplitter;

/// Lazy sequence of features read from one `FeatureCollection` document.
///
/// Fused: after yielding an error it yields nothing further.
pub struct FeatureSequence<R> {
    splitter: FeatureSplitter<R>,
    done: bool,
}

impl<R: Read> FeatureSequence<R> {
    pub fn new(reader: R) -> Self {
        Self {
            splitter: FeatureSplitter::new(reader),
            done: false,
        }
    }
}

impl<R: Read> Iterator for FeatureSequence<R> {
    type Item = ReadResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.splitter.next_chunk() {
            Ok(Some(raw)) => feature_from_value(raw.value, &raw.position),
            Ok(None) => {
                self.done = true;
                return None;
            },
            Err(err) => Err(err),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

/// A GeoJSON `FeatureCollection` stored in a file.
///
/// Each traversal reopens the file, so both conversion passes see the same
/// content.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    path: PathBuf,
}

impl GeoJsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSource for GeoJsonSource {
    type Features = FeatureSequence<File>;

    fn features(&self) -> ReadResult<Self::Features> {
        let file = File::open(&self.path).map_err(|source| ReadError::Io {
            context: self.path.display().to_string(),
            source,
        })?;
        log::debug!("Opened GeoJSON input {}", self.path.display());
        Ok(FeatureSequence::new(file))
    }
}

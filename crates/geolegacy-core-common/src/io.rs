//! I/O traits for reading features and writing output containers.
//!
//! Format crates implement these traits; `geolegacy-core` drives them without
//! knowing which concrete format sits on either side.

use std::path::PathBuf;

use crate::error::{ReadResult, SkipReason, WriteResult};
use crate::types::Feature;

/// A restartable producer of features.
///
/// Every call to [`FeatureSource::features`] starts a fresh, independent
/// traversal of the same logical input, so two passes observe identical
/// sequences.
pub trait FeatureSource {
    /// The lazy sequence produced by one traversal.
    type Features: Iterator<Item = ReadResult<Feature>>;

    /// Opens a new traversal.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing input cannot be opened.
    fn features(&self) -> ReadResult<Self::Features>;
}

/// Result of handing one feature to a writer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    /// A record was written.
    Written,
    /// The feature was excluded; the conversion continues.
    Skipped(SkipReason),
}

impl FeatureOutcome {
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written)
    }
}

/// What a writer produced once finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Every artifact written, in a stable order
    pub files: Vec<PathBuf>,
    /// Number of records (rows) in the output
    pub records: u64,
}

/// Trait for writing a single-layer output container.
///
/// Writers are created for one [`crate::LayerSpec`] and consume features one
/// at a time. Per-feature problems are reported as
/// [`FeatureOutcome::Skipped`]; only conditions that make the whole output
/// unusable are returned as errors.
pub trait FeatureWriter {
    /// Writes one feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can no longer be written to.
    fn write_feature(&mut self, feature: &Feature) -> WriteResult<FeatureOutcome>;

    /// Flushes and closes the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be finalized.
    fn finish(self: Box<Self>) -> WriteResult<WriteSummary>;
}

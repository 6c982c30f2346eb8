//! Error types for `geolegacy` conversions.
//!
//! Terminal failures are modelled as [`ConversionError`]. The recoverable,
//! per-feature counterpart is [`geolegacy_core_common::SkipReason`], which never
//! reaches this type: skipped features are logged and counted instead.

use geolegacy_core_common::{ReadError, WriteError};
use thiserror::Error;

/// Main error type for `geolegacy` conversions.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input is not a well-formed `FeatureCollection`
    #[error("Malformed input: {0}")]
    MalformedInput(#[source] ReadError),

    /// No feature in the whole input carries a geometry
    #[error("No feature in the input carries a geometry")]
    NoGeometry,

    /// The first geometry-bearing feature has no output mapping
    #[error("Unsupported geometry type: {geometry_type}")]
    UnsupportedGeometry {
        /// The geometry type found on the first geometry-bearing feature
        geometry_type: String,
    },

    /// The output container could not be produced
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Invalid options
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O failure outside of the format readers and writers
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What was being done
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The blocking conversion task panicked or was cancelled
    #[error("Conversion task failed: {0}")]
    Task(String),
}

/// Configuration errors.
///
/// These errors occur when options passed to a conversion are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Output format name not recognised
    #[error("Output format '{name}' not recognised. Available formats: {available}")]
    UnknownFormat {
        /// The requested format name
        name: String,
        /// Comma-separated list of accepted names
        available: String,
    },
}

/// Type alias for Results using `ConversionError`.
pub type Result<T> = std::result::Result<T, ConversionError>;

impl From<ReadError> for ConversionError {
    fn from(error: ReadError) -> Self {
        match error {
            ReadError::Io { context, source } => Self::Io {
                context: format!("reading {context}"),
                source,
            },
            parse @ ReadError::Parse { .. } => Self::MalformedInput(parse),
        }
    }
}

impl ConversionError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedInput(e) => format!("The input is not a valid GeoJSON FeatureCollection: {e}"),
            Self::NoGeometry => {
                "The input has no features with a geometry, so there is nothing to convert."
                    .to_string()
            },
            Self::UnsupportedGeometry { geometry_type } => format!(
                "The first geometry in the input is a {geometry_type}, which cannot be written \
                 to a single-geometry layer."
            ),
            Self::Write(e) => format!("Failed to write output: {e}"),
            Self::Config(e) => e.user_message(),
            Self::Io { .. } | Self::Task(_) => self.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::MalformedInput(_) => Some(
                "Check that the file is a complete GeoJSON FeatureCollection with a 'features' array."
                    .to_string(),
            ),
            Self::NoGeometry => {
                Some("Make sure at least one feature has a non-null 'geometry'.".to_string())
            },
            Self::UnsupportedGeometry { .. } => Some(
                "Supported geometry types are Point, MultiPoint, LineString, MultiLineString, \
                 Polygon and MultiPolygon."
                    .to_string(),
            ),
            Self::Config(e) => e.recovery_suggestion(),
            Self::Io { .. } => {
                Some("Check that the paths exist and that you have access to them.".to_string())
            },
            Self::Write(_) | Self::Task(_) => None,
        }
    }

    /// Returns `true` when the caller's input or options are at fault
    /// (the equivalent of a 4xx response) rather than the environment.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_)
                | Self::NoGeometry
                | Self::UnsupportedGeometry { .. }
                | Self::Config(_)
        )
    }

    /// Check if this error is potentially recoverable by retrying with
    /// different options.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::UnknownFormat { name, available } => {
                format!(
                    "Output format '{name}' not recognised.\n\nAvailable formats:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::InvalidOption { .. } => format!("Configuration error: {self}"),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::UnknownFormat { .. } => {
                Some("Run 'geolegacy drivers' to see all available drivers.".to_string())
            },
            Self::InvalidOption { .. } => None,
        }
    }
}

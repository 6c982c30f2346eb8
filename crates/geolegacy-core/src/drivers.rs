//! Driver registry for the formats `geolegacy` reads and writes.
//!
//! Driver short names follow GDAL's naming so that they are familiar to users
//! of `ogr2ogr`. Each driver declares a [`SupportStatus`] per operation.
//!
//! # Examples
//!
//! ```
//! use geolegacy_core::drivers::{OutputFormat, find_driver};
//!
//! let geojson = find_driver("geojson").expect("GeoJSON driver should exist");
//! assert!(geojson.capabilities.read.is_supported());
//!
//! let format: OutputFormat = "shp".parse().unwrap();
//! assert_eq!(format.driver().short_name, "ESRI Shapefile");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Support status for a specific driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The operation is implemented.
    Supported,
    /// The operation is not offered by this driver.
    NotSupported,
}

impl SupportStatus {
    /// Returns `true` if the operation is implemented.
    ///
    /// # Examples
    ///
    /// ```
    /// use geolegacy_core::drivers::SupportStatus;
    ///
    /// assert!(SupportStatus::Supported.is_supported());
    /// assert!(!SupportStatus::NotSupported.is_supported());
    /// ```
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
        }
    }
}

/// Capabilities of a driver.
///
/// `info` covers schema inspection without writing anything, `read` and
/// `write` cover the two sides of a conversion.
#[derive(Debug, Clone, Copy)]
pub struct DriverCapabilities {
    pub info: SupportStatus,
    pub read: SupportStatus,
    pub write: SupportStatus,
}

/// Format driver definition.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Short name used in the CLI and for driver identification (e.g., `"GPKG"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes.
    pub long_name: &'static str,
    /// Operations supported by this driver (info, read, write).
    pub capabilities: DriverCapabilities,
}

impl Driver {
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        info: SupportStatus,
        read: SupportStatus,
        write: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            capabilities: DriverCapabilities { info, read, write },
        }
    }
}

/// Returns the complete driver registry.
#[must_use]
pub fn get_drivers() -> Vec<Driver> {
    use SupportStatus::{NotSupported, Supported};

    vec![
        Driver::new("GeoJSON", "GeoJSON", Supported, Supported, NotSupported),
        Driver::new(
            geolegacy_shapefile::DRIVER_NAME,
            "ESRI Shapefile / DBF",
            NotSupported,
            NotSupported,
            Supported,
        ),
        Driver::new(
            geolegacy_geopackage::DRIVER_NAME,
            "GeoPackage vector",
            NotSupported,
            NotSupported,
            Supported,
        ),
    ]
}

/// Finds a driver by its short name (case-insensitive).
///
/// # Examples
///
/// ```
/// use geolegacy_core::drivers::find_driver;
///
/// assert_eq!(find_driver("gpkg").unwrap().short_name, "GPKG");
/// assert!(find_driver("KML").is_none());
/// ```
#[must_use]
pub fn find_driver(name: &str) -> Option<Driver> {
    get_drivers()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Lists all drivers that support the requested operations.
///
/// A `false` argument means the operation is not required.
#[must_use]
pub fn list_drivers_with_capability(read: bool, write: bool, info: bool) -> Vec<Driver> {
    get_drivers()
        .into_iter()
        .filter(|d| {
            let read_ok = !read || d.capabilities.read.is_supported();
            let write_ok = !write || d.capabilities.write.is_supported();
            let info_ok = !info || d.capabilities.info.is_supported();
            read_ok && write_ok && info_ok
        })
        .collect()
}

/// Returns all driver short names in alphabetically sorted order.
#[must_use]
pub fn get_driver_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_drivers().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}

/// The two output containers a conversion can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// `.shp`, `.shx`, `.dbf` and `.prj` sharing one base name
    Shapefile,
    /// A single `.gpkg` file with one feature table
    GeoPackage,
}

impl OutputFormat {
    /// Accepted spellings, compared case-insensitively.
    pub const NAMES: [&'static str; 6] = [
        "shp",
        "shapefile",
        "ESRI Shapefile",
        "gpkg",
        "geopackage",
        "GPKG",
    ];

    /// The registry entry for this format.
    #[must_use]
    pub fn driver(&self) -> Driver {
        let short_name = match self {
            Self::Shapefile => geolegacy_shapefile::DRIVER_NAME,
            Self::GeoPackage => geolegacy_geopackage::DRIVER_NAME,
        };
        get_drivers()
            .into_iter()
            .find(|d| d.short_name == short_name)
            .unwrap_or(Driver::new(
                short_name,
                short_name,
                SupportStatus::NotSupported,
                SupportStatus::NotSupported,
                SupportStatus::Supported,
            ))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shapefile => "shp",
            Self::GeoPackage => "gpkg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver().short_name)
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if ["shp", "shapefile", "esri shapefile"]
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
        {
            Ok(Self::Shapefile)
        } else if ["gpkg", "geopackage"]
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
        {
            Ok(Self::GeoPackage)
        } else {
            Err(ConfigError::UnknownFormat {
                name: s.to_string(),
                available: Self::NAMES.join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_driver_case_insensitive() {
        let driver = find_driver("esri shapefile");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, "ESRI Shapefile");
    }

    #[test]
    fn test_list_write_drivers() {
        let drivers = list_drivers_with_capability(false, true, false);
        assert_eq!(drivers.len(), 2);
        assert!(drivers.iter().any(|d| d.short_name == "ESRI Shapefile"));
        assert!(drivers.iter().any(|d| d.short_name == "GPKG"));

        let readers = list_drivers_with_capability(true, false, false);
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].short_name, "GeoJSON");
    }

    #[test]
    fn test_driver_names_sorted() {
        assert_eq!(get_driver_names(), vec!["ESRI Shapefile", "GPKG", "GeoJSON"]);
    }

    #[test]
    fn test_output_format_parsing() {
        for name in ["shp", "SHP", "Shapefile", "ESRI Shapefile", " shp "] {
            assert_eq!(name.parse::<OutputFormat>().unwrap(), OutputFormat::Shapefile, "{name}");
        }
        for name in ["gpkg", "GPKG", "GeoPackage"] {
            assert_eq!(name.parse::<OutputFormat>().unwrap(), OutputFormat::GeoPackage, "{name}");
        }
        let err = "kml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat { .. }));
    }

    #[test]
    fn test_output_format_driver() {
        assert_eq!(OutputFormat::GeoPackage.driver().short_name, "GPKG");
        assert!(OutputFormat::Shapefile.driver().capabilities.write.is_supported());
        assert_eq!(OutputFormat::Shapefile.to_string(), "ESRI Shapefile");
    }
}

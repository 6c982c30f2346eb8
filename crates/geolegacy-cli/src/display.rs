//! Display utilities for formatting CLI output.

use tabled::{Table, Tabled};

use geolegacy_core::drivers::Driver;
use geolegacy_core::types::{ConversionReport, FieldInfo, InspectReport};

/// Table row representation for displaying driver information.
#[derive(Tabled)]
pub struct DriverRow {
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    #[tabled(rename = "Info")]
    pub info: String,
    #[tabled(rename = "Read")]
    pub read: String,
    #[tabled(rename = "Write")]
    pub write: String,
}

impl From<&Driver> for DriverRow {
    fn from(d: &Driver) -> Self {
        Self {
            short_name: d.short_name.to_string(),
            long_name: d.long_name.to_string(),
            info: d.capabilities.info.as_str().to_string(),
            read: d.capabilities.read.as_str().to_string(),
            write: d.capabilities.write.as_str().to_string(),
        }
    }
}

/// One inferred property, as shown by `inspect`.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Property")]
    pub key: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    /// Column name after truncation to the dBase limit.
    #[tabled(rename = "Shapefile Column")]
    pub shapefile_name: String,
}

impl From<FieldInfo> for FieldRow {
    fn from(f: FieldInfo) -> Self {
        Self {
            key: f.key,
            kind: f.kind.as_str().to_string(),
            shapefile_name: f.shapefile_name,
        }
    }
}

/// Column mapping of a finished conversion.
#[derive(Tabled)]
pub struct ColumnRow {
    #[tabled(rename = "Property")]
    pub key: String,
    #[tabled(rename = "Column")]
    pub column: String,
    #[tabled(rename = "Type")]
    pub kind: String,
}

pub fn display_drivers(drivers: &[Driver]) {
    println!("\nAvailable Drivers ({} total):\n", drivers.len());
    let rows: Vec<DriverRow> = drivers.iter().map(DriverRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Prints the schema preview produced by `inspect`.
pub fn display_inspect(report: &InspectReport) {
    println!("\nGeometry: {}", report.family);
    println!(
        "Features: {} ({} with geometry)",
        report.features_seen, report.features_with_geometry
    );

    if report.schema.is_empty() {
        println!("\nNo attribute fields.");
        return;
    }

    println!("\n=== Fields ===");
    let rows: Vec<FieldRow> = report.fields().into_iter().map(FieldRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Prints what a conversion wrote.
pub fn display_conversion(report: &ConversionReport) {
    println!("\nFormat: {}", report.format);
    println!("Geometry: {}", report.family);
    println!(
        "Records: {} written from {} feature(s); {} skipped, {} without geometry",
        report.records_written,
        report.features_read,
        report.features_skipped,
        report.features_without_geometry
    );

    if !report.schema.is_empty() {
        println!("\n=== Columns ===");
        println!("{}", Table::new(column_rows(report)));
    }

    println!("\nOutputs:");
    for path in &report.outputs {
        println!("  {}", path.display());
    }
}

fn column_rows(report: &ConversionReport) -> Vec<ColumnRow> {
    report
        .schema
        .iter()
        .map(|(key, kind)| ColumnRow {
            key: key.to_string(),
            column: report.field_names.get(key).unwrap_or(key).to_string(),
            kind: kind.as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geolegacy_core::drivers::{OutputFormat, get_drivers};
    use geolegacy_core_common::{FieldKind, FieldNameMap, GeometryFamily, Schema};

    fn schema() -> (Schema, FieldNameMap) {
        let mut schema = Schema::new();
        schema.observe("population_total", FieldKind::Integer);
        schema.observe("name", FieldKind::Text);
        let mut names = FieldNameMap::new();
        names.bind("population_total", "population");
        names.bind("name", "name");
        (schema, names)
    }

    #[test]
    fn test_driver_rows() {
        let rows: Vec<DriverRow> = get_drivers().iter().map(DriverRow::from).collect();
        let gpkg = rows.iter().find(|r| r.short_name == "GPKG").unwrap();
        assert_eq!(gpkg.write, "Supported");
        assert_eq!(gpkg.read, "Not Supported");
        display_drivers(&get_drivers());
    }

    #[test]
    fn test_column_rows_use_mapped_names() {
        let (schema, field_names) = schema();
        let report = ConversionReport {
            format: OutputFormat::Shapefile,
            outputs: vec!["out/a.shp".into(), "out/a.shx".into()],
            family: GeometryFamily::Point,
            schema,
            field_names,
            features_read: 3,
            records_written: 2,
            features_skipped: 1,
            features_without_geometry: 0,
        };
        let rows = column_rows(&report);
        assert_eq!(rows[0].key, "population_total");
        assert_eq!(rows[0].column, "population");
        assert_eq!(rows[0].kind, "Integer");
        assert_eq!(rows[1].column, "name");
        display_conversion(&report);
    }

    #[test]
    fn test_display_inspect_without_fields() {
        let report = InspectReport {
            family: GeometryFamily::Polygon,
            schema: Schema::new(),
            shapefile_names: FieldNameMap::new(),
            features_seen: 1,
            features_with_geometry: 1,
        };
        display_inspect(&report);
    }
}

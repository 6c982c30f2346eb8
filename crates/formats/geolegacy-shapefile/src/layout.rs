//! dBASE column layout and value fitting.

use geolegacy_core_common::{ColumnSpec, FieldKind, PropertyValue, SkipReason, truncate_utf8};
use shapefile::dbase::FieldValue;

pub const INTEGER_WIDTH: u8 = 20;
pub const REAL_WIDTH: u8 = 18;
pub const REAL_DECIMALS: u8 = 10;
pub const TEXT_WIDTH: u8 = 254;

/// Physical `.dbf` field layout for a column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    Numeric { width: u8, decimals: u8 },
    Character { width: u8 },
}

#[must_use]
pub fn layout_for(kind: FieldKind) -> FieldLayout {
    match kind {
        FieldKind::Integer => FieldLayout::Numeric {
            width: INTEGER_WIDTH,
            decimals: 0,
        },
        FieldKind::Real => FieldLayout::Numeric {
            width: REAL_WIDTH,
            decimals: REAL_DECIMALS,
        },
        FieldKind::Text => FieldLayout::Character { width: TEXT_WIDTH },
    }
}

/// Converts a property value into the `.dbf` value for `column`.
///
/// Missing keys and values that cannot be represented in the column kind
/// become null. Decimals that do not fit the field width are dropped when the
/// record is written; only numbers whose integer part is wider than the field
/// are rejected so the whole feature can be skipped.
///
/// # Errors
///
/// Returns [`SkipReason::ValueOutOfRange`] when a numeric value does not fit.
pub fn fit_value(
    column: &ColumnSpec,
    value: Option<&PropertyValue>,
) -> Result<FieldValue, SkipReason> {
    let value = value.unwrap_or(&PropertyValue::Null);
    match (layout_for(column.kind), column.kind) {
        (FieldLayout::Numeric { width, decimals }, FieldKind::Integer) => {
            #[allow(clippy::cast_precision_loss)]
            let number = value.as_integer().map(|v| v as f64);
            fit_numeric(column, number, width, decimals).map(FieldValue::Numeric)
        },
        (FieldLayout::Numeric { width, decimals }, _) => {
            fit_numeric(column, value.as_real(), width, decimals).map(FieldValue::Numeric)
        },
        (FieldLayout::Character { width }, _) => Ok(FieldValue::Character(
            value
                .to_text()
                .map(|text| truncate_utf8(&text, usize::from(width)).to_string()),
        )),
    }
}

fn fit_numeric(
    column: &ColumnSpec,
    number: Option<f64>,
    width: u8,
    decimals: u8,
) -> Result<Option<f64>, SkipReason> {
    let Some(number) = number else {
        return Ok(None);
    };
    let integer_part = format!("{number:.0}");
    if !number.is_finite() || integer_part.len() > usize::from(width) {
        return Err(SkipReason::ValueOutOfRange {
            column: column.name.clone(),
            value: format!("{number:.prec$}", prec = usize::from(decimals)),
        });
    }
    Ok(Some(number))
}

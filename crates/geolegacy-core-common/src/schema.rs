//! Attribute schema types shared by the inference pass and the writers.

use std::fmt;

use indexmap::IndexMap;

use crate::types::{GeometryFamily, PropertyValue};

/// Column kind inferred for a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

impl FieldKind {
    /// Kind of a single non-null value, after the inference-only
    /// normalization (booleans count as integers).
    #[must_use]
    pub fn of_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => None,
            PropertyValue::Integer(_) | PropertyValue::Boolean(_) => Some(Self::Integer),
            PropertyValue::Real(_) => Some(Self::Real),
            PropertyValue::Text(_) => Some(Self::Text),
        }
    }

    /// Least upper bound of two kinds.
    ///
    /// `Integer < Real < Text`; `Text` absorbs everything. Total and
    /// commutative.
    #[must_use]
    pub fn promote(self, other: Self) -> Self {
        match (self, other) {
            (Self::Integer, Self::Integer) => Self::Integer,
            (Self::Integer | Self::Real, Self::Integer | Self::Real) => Self::Real,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified, ordered attribute schema. Order is first-seen order of the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: IndexMap<String, FieldKind>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds an observed kind into the schema.
    pub fn observe(&mut self, key: &str, kind: FieldKind) {
        if let Some(existing) = self.fields.get_mut(key) {
            *existing = existing.promote(kind);
        } else {
            self.fields.insert(key.to_string(), kind);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<FieldKind> {
        self.fields.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One-to-one mapping from property key to output column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldNameMap {
    names: IndexMap<String, String>,
}

impl FieldNameMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.names.insert(key.into(), name.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A single output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Property key the values are read from
    pub key: String,
    /// Column name in the output container
    pub name: String,
    pub kind: FieldKind,
}

/// Everything a writer needs to lay out its single output layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    /// Base name of the output artifacts and, for containers, the layer name
    pub name: String,
    pub family: GeometryFamily,
    pub columns: Vec<ColumnSpec>,
}

impl LayerSpec {
    /// Builds the column list in schema order. Keys missing from `names`
    /// fall back to the key itself.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        family: GeometryFamily,
        schema: &Schema,
        names: &FieldNameMap,
    ) -> Self {
        let columns = schema
            .iter()
            .map(|(key, kind)| ColumnSpec {
                key: key.to_string(),
                name: names.get(key).unwrap_or(key).to_string(),
                kind,
            })
            .collect();
        Self {
            name: name.into(),
            family,
            columns,
        }
    }
}

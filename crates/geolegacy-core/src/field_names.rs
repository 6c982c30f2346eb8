//! Mapping property keys onto output column names.
//!
//! Names are assigned greedily in schema order. A key is first truncated to the
//! format's length limit; if that candidate is already taken, numeric suffixes
//! `1`, `2`, ... are tried with the key re-truncated so that key plus suffix
//! still fits. The result only depends on the key order.

use std::collections::HashSet;

use geolegacy_core_common::{FieldNameMap, truncate_utf8};

/// Resolves property keys into unique column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNameResolver {
    max_len: Option<usize>,
    case_insensitive: bool,
    reserved: Vec<String>,
}

impl Default for FieldNameResolver {
    fn default() -> Self {
        Self::shapefile()
    }
}

impl FieldNameResolver {
    /// dBASE rules: at most 10 bytes, exact-match uniqueness.
    #[must_use]
    pub fn shapefile() -> Self {
        Self {
            max_len: Some(geolegacy_shapefile::MAX_FIELD_NAME_BYTES),
            case_insensitive: false,
            reserved: Vec::new(),
        }
    }

    /// SQLite rules: no length limit, case-insensitive uniqueness, and the
    /// feature table's own `fid` and `geom` columns are taken.
    #[must_use]
    pub fn geopackage() -> Self {
        Self {
            max_len: None,
            case_insensitive: true,
            reserved: vec![
                geolegacy_geopackage::FID_COLUMN.to_string(),
                geolegacy_geopackage::GEOMETRY_COLUMN.to_string(),
            ],
        }
    }

    /// Sets the maximum name length in bytes (`None` for unbounded).
    #[must_use]
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Adds names that no key may resolve to.
    #[must_use]
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Resolves `keys` in order.
    ///
    /// Every key gets a name; names are unique under the resolver's comparison
    /// rule and never longer than its maximum length.
    pub fn resolve<'a, I>(&self, keys: I) -> FieldNameMap
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut used: HashSet<String> = self.reserved.iter().map(|n| self.fold(n)).collect();
        let mut names = FieldNameMap::new();

        for key in keys {
            let mut candidate = self.truncate(key, 0).to_string();
            let mut suffix = 0u64;
            while candidate.is_empty() || used.contains(&self.fold(&candidate)) {
                suffix += 1;
                let digits = suffix.to_string();
                candidate = format!("{}{digits}", self.truncate(key, digits.len()));
            }

            if candidate != key {
                log::debug!("Field '{key}' renamed to '{candidate}'");
            }
            used.insert(self.fold(&candidate));
            names.bind(key, candidate);
        }
        names
    }

    /// Longest prefix of `key` that leaves room for `reserve` more bytes.
    fn truncate<'k>(&self, key: &'k str, reserve: usize) -> &'k str {
        match self.max_len {
            Some(max) => truncate_utf8(key, max.saturating_sub(reserve)),
            None => key,
        }
    }

    fn fold(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

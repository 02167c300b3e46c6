use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::SqlValue;

/// One row of a result set.
///
/// Behaves as a mapping from column name to value whose iteration order is
/// the column order reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column names, shared by every row of the same result set
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create a row from shared column names and this row's values.
    ///
    /// Missing trailing values read as NULL; surplus values are dropped.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, mut values: Vec<SqlValue>) -> Self {
        values.resize(column_names.len(), SqlValue::Null);
        Self {
            column_names,
            values,
        }
    }

    /// Value of the named column.
    ///
    /// When a batch selects the same name twice the later column wins, as it
    /// would when building a name-keyed mapping column by column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_names
            .iter()
            .rposition(|name| name == column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serialized as an object in column order. A repeated column name is
/// written once, with the value [`Row::get`] returns, at its last position.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = &self.column_names;
        let shadowed = |idx: usize| names[idx + 1..].contains(&names[idx]);
        let mut map = serializer.serialize_map(None)?;
        for (idx, (name, value)) in self.iter().enumerate() {
            if !shadowed(idx) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

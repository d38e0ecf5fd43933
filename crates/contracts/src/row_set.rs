//! RowSet - rows accumulated from the engine's output step
//!
//! Rows are appended through a single [`RowSetBuilder`] and frozen into an
//! immutable [`RowSet`] before anything reads them.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::{Row, RowSchema};

/// A row with the schema it arrived with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEntry {
    pub row: Row,
    pub schema: RowSchema,
}

/// Append-only row accumulator (single writer)
#[derive(Debug, Default)]
pub struct RowSetBuilder {
    entries: Vec<RowEntry>,
}

impl RowSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row in arrival order
    pub fn push(&mut self, row: Row, schema: RowSchema) {
        self.entries.push(RowEntry { row, schema });
    }

    /// Append every entry of an already frozen set, preserving order
    pub fn extend(&mut self, rows: RowSet) {
        self.entries.extend(rows.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of schema descriptors accumulated so far
    pub fn schema_count(&self) -> usize {
        self.entries.len()
    }

    /// Freeze into a read-only RowSet
    pub fn freeze(self) -> RowSet {
        RowSet {
            entries: self.entries,
        }
    }
}

/// Frozen, ordered sequence of `(row, schema)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    entries: Vec<RowEntry>,
}

impl RowSet {
    /// Empty, already frozen set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of schema descriptors accumulated (one per row)
    pub fn schema_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[RowEntry] {
        &self.entries
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.entries.iter().map(|e| &e.row)
    }

    pub fn first(&self) -> Option<&RowEntry> {
        self.entries.first()
    }
}

impl FromIterator<(Row, RowSchema)> for RowSet {
    fn from_iter<I: IntoIterator<Item = (Row, RowSchema)>>(iter: I) -> Self {
        let mut builder = RowSetBuilder::new();
        for (row, schema) in iter {
            builder.push(row, schema);
        }
        builder.freeze()
    }
}

/// Serializes as an array of row arrays; schemas are not part of the document.
impl Serialize for RowSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            seq.serialize_element(&entry.row)?;
        }
        seq.end()
    }
}

//! In-memory columnar table.
//!
//! The engine consumes and produces tables through a small capability set:
//! column listing, column access by name, row count, row selection, and
//! column addition. Tables are immutable during any join, grouping, or
//! window operation; the engine only reads them and constructs new ones.

use serde::{Deserialize, Serialize};

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};
use crate::spanjoin::table::types::FieldValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Column {
    name: String,
    values: Vec<FieldValue>,
}

/// An ordered collection of equal-length named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs.
    ///
    /// Fails when two columns share a name or when column lengths differ.
    pub fn from_columns<N: Into<String>>(
        columns: Vec<(N, Vec<FieldValue>)>,
    ) -> SpanJoinResult<Self> {
        let mut table = Table::new();
        for (name, values) in columns {
            table = table.with_column(name, values)?;
        }
        Ok(table)
    }

    /// Ordered column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// The values of a column, in row order.
    pub fn column(&self, name: &str) -> Option<&[FieldValue]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// The values of a column, or a specification error naming the available
    /// columns when it is absent.
    pub fn require_column(&self, name: &str) -> SpanJoinResult<&[FieldValue]> {
        self.column(name).ok_or_else(|| {
            SpanJoinError::missing_column(
                name,
                self.column_names().iter().map(|s| s.to_string()).collect(),
            )
        })
    }

    /// Number of rows (zero for a table with no columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// One row's cells, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<FieldValue>> {
        if index >= self.row_count() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| c.values[index].clone())
                .collect(),
        )
    }

    /// A new table containing the given rows, in the given order.
    ///
    /// Indices may repeat; each out-of-bounds index is a specification error.
    pub fn select_rows(&self, indices: &[usize]) -> SpanJoinResult<Table> {
        let rows = self.row_count();
        if let Some(&bad) = indices.iter().find(|&&i| i >= rows) {
            return Err(SpanJoinError::specification(format!(
                "row index {} out of bounds for table with {} rows",
                bad, rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Ok(Table { columns })
    }

    /// A new table with an additional column appended.
    ///
    /// Fails on a duplicate name, or when the new column's length differs
    /// from the existing row count (any length is accepted for a table that
    /// has no columns yet).
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<FieldValue>,
    ) -> SpanJoinResult<Table> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(SpanJoinError::specification_for(
                name.clone(),
                format!("duplicate column name '{}'", name),
            ));
        }
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(SpanJoinError::specification_for(
                name.clone(),
                format!(
                    "column '{}' has {} values but the table has {} rows",
                    name,
                    values.len(),
                    self.row_count()
                ),
            ));
        }
        let mut columns = self.columns.clone();
        columns.push(Column { name, values });
        Ok(Table { columns })
    }
}

//! Columnar in-memory table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One column of cells; `None` is a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    /// Cells at `rows`, in that order.
    pub fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Cell `i` rendered as a join key; missing cells have no key.
    pub(crate) fn key_at(&self, i: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v[i].map(|x| x.to_string()),
            Column::Text(v) => v[i].clone(),
        }
    }
}

/// Rows extracted for clustering.
///
/// `rows[i]` came from table row `source_rows[i]`; rows with a missing value
/// in any selected column are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub source_rows: Vec<usize>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// A rectangular table of named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table; every column must have the same length and a unique name.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut table = Table {
            names: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
            n_rows,
        };
        for (name, column) in columns {
            if table.names.contains(&name) {
                return Err(Error::InvalidParameter {
                    name: "columns",
                    message: "column names must be unique",
                });
            }
            table.push(name, column)?;
        }
        Ok(table)
    }

    fn push(&mut self, name: String, column: Column) -> Result<()> {
        if column.len() != self.n_rows {
            return Err(Error::RowCountMismatch {
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// A numeric column's cells.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| Error::NonNumericColumn(name.to_string()))
    }

    /// Extract the rows used for clustering.
    ///
    /// Every column is checked before any row is read, so an unknown or
    /// non-numeric column fails without partial work.
    pub fn feature_matrix(&self, subset: &[String]) -> Result<FeatureMatrix> {
        if subset.is_empty() {
            return Err(Error::EmptyFeatureSubset);
        }
        let cols: Vec<&[Option<f64>]> = subset
            .iter()
            .map(|name| self.numeric(name))
            .collect::<Result<_>>()?;

        let mut rows = Vec::with_capacity(self.n_rows);
        let mut source_rows = Vec::with_capacity(self.n_rows);
        'rows: for i in 0..self.n_rows {
            let mut row = Vec::with_capacity(cols.len());
            for col in &cols {
                match col[i] {
                    Some(v) if !v.is_nan() => row.push(v),
                    _ => continue 'rows,
                }
            }
            rows.push(row);
            source_rows.push(i);
        }

        let dropped = self.n_rows - rows.len();
        if dropped > 0 {
            debug!(dropped, kept = rows.len(), "skipped rows with missing feature values");
        }
        Ok(FeatureMatrix {
            columns: subset.to_vec(),
            rows,
            source_rows,
        })
    }

    /// A new table holding `rows` in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            n_rows: rows.len(),
        }
    }

    /// Add `column`, or replace an existing column of the same name.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Table> {
        let name = name.into();
        if column.len() != self.n_rows {
            return Err(Error::RowCountMismatch {
                expected: self.n_rows,
                found: column.len(),
            });
        }
        match self.names.iter().position(|n| *n == name) {
            Some(i) => self.columns[i] = column,
            None => self.push(name, column)?,
        }
        Ok(self)
    }
}

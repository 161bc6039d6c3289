use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' not found in table")]
    MissingColumn { column: String },

    #[error("Column '{column}' appears more than once in the header")]
    DuplicateColumn { column: String },

    #[error("Row has {found} cells but the table has {expected} columns")]
    RowLength { expected: usize, found: usize },

    #[error("Row {row}, column '{column}': expected a number, found '{value}'")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row index {row} out of range for table with {len} rows")]
    RowOutOfRange { row: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Interprets a raw text field: blank becomes `Empty`, a finite float becomes
    /// `Number`, everything else (including `NaN` and `inf`) is kept verbatim as `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(trimmed.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Empty => Ok(()),
        }
    }
}

/// The accumulated record of experiments: named columns, one row per physical run.
///
/// Rows are only ever appended. Column lookup is by name so that parameter and
/// measurement columns can be chosen per campaign.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl DataTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self, TableError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn column_index(&self, column: &str) -> Result<usize, TableError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| TableError::MissingColumn {
                column: column.to_string(),
            })
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends every row of `batch`, matching columns by name.
    ///
    /// Columns of `self` that `batch` lacks are filled with [`Cell::Empty`]; columns
    /// only present in `batch` are dropped.
    pub fn append(&mut self, batch: &DataTable) -> usize {
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|name| batch.index.get(name).copied())
            .collect();

        for source in &batch.rows {
            let row = mapping
                .iter()
                .map(|slot| match slot {
                    Some(i) => source[*i].clone(),
                    None => Cell::Empty,
                })
                .collect();
            self.rows.push(row);
        }
        batch.rows.len()
    }

    pub fn row(&self, row: usize) -> Result<&[Cell], TableError> {
        self.rows
            .get(row)
            .map(Vec::as_slice)
            .ok_or(TableError::RowOutOfRange {
                row,
                len: self.rows.len(),
            })
    }

    pub fn cell(&self, row: usize, column: &str) -> Result<&Cell, TableError> {
        let col = self.column_index(column)?;
        Ok(&self.row(row)?[col])
    }

    /// Reads a numeric cell. Text, empty and non-finite cells are reported, never coerced.
    pub fn number(&self, row: usize, column: &str) -> Result<f64, TableError> {
        match self.cell(row, column)? {
            Cell::Number(v) if v.is_finite() => Ok(*v),
            other => Err(TableError::NonNumeric {
                row,
                column: column.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Reads several numeric columns of one row, in the order given.
    pub fn numbers(&self, row: usize, columns: &[String]) -> Result<Vec<f64>, TableError> {
        columns.iter().map(|c| self.number(row, c)).collect()
    }

    /// Returns a new table holding the selected rows, in the order given.
    pub fn select(&self, rows: &[usize]) -> Result<DataTable, TableError> {
        let mut out = DataTable {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: Vec::with_capacity(rows.len()),
        };
        for &r in rows {
            out.rows.push(self.row(r)?.to_vec());
        }
        Ok(out)
    }
}

//! In-memory delimited tables.
//!
//! A [`Table`] is an ordered header plus ordered rows. Every [`Row`] keeps the
//! position it had in the file it was read from, so filtering a table never
//! loses track of where a record came from.

use indexmap::IndexMap;
use std::fmt;

/// Sentinel written for any value that is absent or cannot be determined.
pub const NA: &str = "NA";

/// Cell texts treated as "not available" when reading.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

/// Check whether a cell value counts as missing.
///
/// Empty cells and the usual "not available" markers are missing.
pub fn is_missing(value: &str) -> bool {
    value.is_empty() || MISSING_MARKERS.contains(&value)
}

/// Error type for table operations
#[derive(Debug)]
pub enum TableError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingHeader {
        marker: String,
    },
    MissingColumn {
        column: String,
        context: String,
    },
    RaggedRow {
        position: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io(e) => write!(f, "IO error: {}", e),
            TableError::Csv(e) => write!(f, "CSV error: {}", e),
            TableError::MissingHeader { marker } => {
                write!(f, "No header line starting with '{}' found", marker)
            }
            TableError::MissingColumn { column, context } => {
                write!(f, "Required column '{}' is missing from {}", column, context)
            }
            TableError::RaggedRow {
                position,
                expected,
                found,
            } => write!(
                f,
                "Row {} has {} fields but the header declares {}",
                position, found, expected
            ),
        }
    }
}

impl std::error::Error for TableError {}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Io(err)
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        TableError::Csv(err)
    }
}

/// A single record: column name -> text value, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    position: usize,
    fields: IndexMap<String, String>,
}

impl Row {
    pub fn new(position: usize, fields: IndexMap<String, String>) -> Self {
        Self { position, fields }
    }

    /// 0-based index of this row among the data rows of its source file.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Get a value, or [`NA`] when the column is absent.
    pub fn get_or_na(&self, column: &str) -> &str {
        self.get(column).unwrap_or(NA)
    }

    /// Set a value. An existing column keeps its position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.fields.shift_remove(column)
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of missing cells across the whole row.
    pub fn missing_count(&self) -> usize {
        self.fields.values().filter(|v| is_missing(v)).count()
    }

    /// Combine this row with `other`; values from `other` win on shared columns.
    ///
    /// Shared columns keep their position from `self`, columns only in `other`
    /// are appended in `other`'s order. The result keeps `self`'s position.
    pub fn merged_with(&self, other: &Row) -> Row {
        let mut fields = self.fields.clone();
        for (column, value) in &other.fields {
            fields.insert(column.clone(), value.clone());
        }
        Row {
            position: self.position,
            fields,
        }
    }
}

/// An ordered header plus ordered rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a row given as values in header order.
    ///
    /// Short rows are padded with empty (missing) cells; long rows are an error.
    pub fn push_values(&mut self, position: usize, values: Vec<String>) -> Result<(), TableError> {
        if values.len() > self.columns.len() {
            return Err(TableError::RaggedRow {
                position,
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let mut values = values.into_iter();
        let fields = self
            .columns
            .iter()
            .map(|column| (column.clone(), values.next().unwrap_or_default()))
            .collect();

        self.rows.push(Row::new(position, fields));
        Ok(())
    }

    /// Append a row, projecting it onto this table's header.
    ///
    /// Columns the row lacks are filled with [`NA`]; extra columns are dropped.
    pub fn push_row(&mut self, row: Row) {
        let fields = self
            .columns
            .iter()
            .map(|column| (column.clone(), row.get_or_na(column).to_string()))
            .collect();
        self.rows.push(Row::new(row.position, fields));
    }

    /// Fail with [`TableError::MissingColumn`] unless every column is present.
    pub fn require_columns(&self, columns: &[&str], context: &str) -> Result<(), TableError> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(column) => Err(TableError::MissingColumn {
                column: column.to_string(),
                context: context.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Keep the rows matching `predicate`. Positions are preserved.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Keep the rows whose `column` equals `value` exactly.
    ///
    /// `context` names the table in the error when `column` is absent.
    pub fn filter_eq(&self, column: &str, value: &str, context: &str) -> Result<Table, TableError> {
        self.require_columns(&[column], context)?;
        Ok(self.filter(|row| row.get(column) == Some(value)))
    }
}

/// Keep the clinical rows belonging to one gene.
pub fn filter_by_gene(table: &Table, gene_name: &str) -> Result<Table, TableError> {
    table.filter_eq("GeneSymbol", gene_name, "clinical table")
}

//! Table writers.
//!
//! Tables are written as CSV by default, or as NDJSON (one JSON object per
//! row, keys in column order).

use crate::table::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
    CsvError(csv::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl From<csv::Error> for SerializationError {
    fn from(err: csv::Error) -> Self {
        SerializationError::CsvError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
            SerializationError::CsvError(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Output format for tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Ndjson,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            _ => Err(format!("Unknown format: {}. Use csv or ndjson", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}

/// CSV table writer
///
/// Writes the header row, then every row in header order. The header is
/// written even when the table has no rows.
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn write_table(&mut self, table: &Table) -> Result<(), SerializationError> {
        self.writer.write_record(table.columns())?;
        for row in table.rows() {
            self.writer
                .write_record(table.columns().iter().map(|c| row.get_or_na(c)))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes each row as one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    /// Create a new NDJSON writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write every row of a table
    pub fn write_table(&mut self, table: &Table) -> Result<(), SerializationError> {
        for row in table.rows() {
            let json = serde_json::to_string(row.fields())?;
            writeln!(self.writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write a table in the given format.
pub fn write_table<W: Write>(
    table: &Table,
    format: OutputFormat,
    writer: W,
) -> Result<(), SerializationError> {
    match format {
        OutputFormat::Csv => {
            let mut csv = CsvWriter::new(writer);
            csv.write_table(table)?;
            csv.flush()
        }
        OutputFormat::Ndjson => {
            let mut ndjson = NdjsonWriter::new(writer);
            ndjson.write_table(table)?;
            ndjson.flush()
        }
    }
}

/// Create (or truncate) `path` and write a table to it.
pub fn write_table_to_path<P: AsRef<Path>>(
    table: &Table,
    format: OutputFormat,
    path: P,
) -> Result<(), SerializationError> {
    let file = File::create(path.as_ref())?;
    write_table(table, format, BufWriter::new(file))
}

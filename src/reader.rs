//! Readers for the delimited input tables.
//!
//! - Clinical and normalized annotation tables are plain CSV with a header.
//! - Raw VEP output is tab-separated and starts with `##` metadata lines; the
//!   real header is the first line beginning with `#Uploaded_variation`.

use crate::table::{Table, TableError};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Marker that starts the header line of VEP tab-delimited output.
pub const VEP_HEADER_MARKER: &str = "#Uploaded_variation";

/// Read a comma-delimited table with a header row.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let table = read_csv_from(file)?;

    tracing::debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );

    Ok(table)
}

/// Read a comma-delimited table with a header row from any reader.
pub fn read_csv_from<R: Read>(reader: R) -> Result<Table, TableError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    read_records(reader)
}

/// Read raw VEP tab-delimited output, skipping metadata lines.
///
/// # Errors
/// Returns [`TableError::MissingHeader`] if no line starts with
/// `#Uploaded_variation`.
pub fn read_vep<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let table = read_vep_str(&contents)?;

    tracing::debug!(
        "Read {} VEP rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );

    Ok(table)
}

/// Parse VEP tab-delimited output held in memory.
pub fn read_vep_str(contents: &str) -> Result<Table, TableError> {
    let mut offset = 0;
    let mut header_start = None;
    for line in contents.split_inclusive('\n') {
        if line.starts_with(VEP_HEADER_MARKER) {
            header_start = Some(offset);
            break;
        }
        offset += line.len();
    }

    let header_start = header_start.ok_or_else(|| TableError::MissingHeader {
        marker: VEP_HEADER_MARKER.to_string(),
    })?;

    tracing::debug!("Skipped {} bytes of VEP metadata", header_start);

    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(contents[header_start..].as_bytes());

    read_records(reader)
}

/// Make header names unique: a repeated `X` becomes `X.1`, `X.2`, ...
///
/// A generated name that is itself taken gets another suffix, so every
/// column keeps its own values.
fn dedupe_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for header in headers {
        let mut name = header.to_string();
        let mut count = seen.get(&name).copied().unwrap_or(0);
        while count > 0 {
            seen.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = seen.get(&name).copied().unwrap_or(0);
        }

        if name != header {
            tracing::warn!("Duplicate column '{}' renamed to '{}'", header, name);
        }
        seen.insert(name.clone(), 1);
        columns.push(name);
    }

    columns
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Table, TableError> {
    let columns = dedupe_headers(reader.headers()?.iter());
    let mut table = Table::new(columns);

    for (position, result) in reader.records().enumerate() {
        let record = result?;
        table.push_values(position, record.iter().map(|v| v.to_string()).collect())?;
    }

    Ok(table)
}

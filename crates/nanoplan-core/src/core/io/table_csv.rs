use crate::core::models::table::{Cell, DataTable, TableError};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid table layout in '{path}': {source}")]
    Table { path: String, source: TableError },
}

/// Loads a headered CSV file. Field types are inferred per cell (see [`Cell::parse`]).
pub fn load_table(path: &Path) -> Result<DataTable, TableLoadError> {
    let label = path.to_string_lossy().to_string();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| TableLoadError::Csv {
            path: label.clone(),
            source: e,
        })?;
    let table = read_records(reader, &label)?;
    debug!(path = %label, rows = table.len(), "Loaded experiment table.");
    Ok(table)
}

pub fn read_table<R: Read>(input: R) -> Result<DataTable, TableLoadError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    read_records(reader, "<reader>")
}

fn read_records<R: Read>(mut reader: csv::Reader<R>, label: &str) -> Result<DataTable, TableLoadError> {
    let csv_err = |e| TableLoadError::Csv {
        path: label.to_string(),
        source: e,
    };
    let table_err = |e| TableLoadError::Table {
        path: label.to_string(),
        source: e,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut table = DataTable::new(headers.iter()).map_err(table_err)?;

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table
            .push_row(record.iter().map(Cell::parse).collect())
            .map_err(table_err)?;
    }
    Ok(table)
}

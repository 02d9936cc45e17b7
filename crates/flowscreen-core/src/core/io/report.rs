use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Record {index} has {found} cells but the header has {expected}")]
    Shape {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// A header plus records of string cells, all of equal width.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularReport {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
}

impl TabularReport {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Appends a record, rejecting ones whose width differs from the header.
    pub fn push(&mut self, record: Vec<String>) -> Result<(), ExportError> {
        if record.len() != self.columns.len() {
            return Err(ExportError::Shape {
                index: self.records.len(),
                expected: self.columns.len(),
                found: record.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    pub fn write_to(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for record in &self.records {
            csv_writer.write_record(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the table to `path`, replacing any existing file.
    pub fn write_to_path(&self, path: &Path) -> Result<(), ExportError> {
        let display = path.to_string_lossy().to_string();
        let file = File::create(path).map_err(|e| ExportError::Io {
            path: display.clone(),
            source: e,
        })?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| ExportError::Csv {
                path: display,
                source: e,
            })
    }
}

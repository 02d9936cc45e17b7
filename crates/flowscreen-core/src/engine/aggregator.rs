use crate::core::io::report::{ExportError, TabularReport};
use crate::core::models::row::ResultRow;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const CASE_TYPE_COLUMN: &str = "CaseType";
pub const SUCCESS_COLUMN: &str = "Success";
pub const ERROR_COLUMN: &str = "Error";
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Columns every export carries. Parameter and metric keys must not reuse them.
pub const RESERVED_COLUMNS: [&str; 4] = [
    CASE_TYPE_COLUMN,
    SUCCESS_COLUMN,
    ERROR_COLUMN,
    TIMESTAMP_COLUMN,
];

/// Append-only collection of result rows, in execution order.
///
/// The export schema is derived from the rows themselves: `CaseType`, then every
/// parameter and metric key in the order it was first seen, then `Success`, `Error`
/// and `Timestamp`. Rows missing a key get a blank cell.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    rows: Vec<ResultRow>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.rows.iter().filter(|r| r.success()).count()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![CASE_TYPE_COLUMN.to_string()];
        for key in self.rows.iter().flat_map(|r| r.keys()) {
            if !RESERVED_COLUMNS.iter().any(|r| *r == key) && !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
        columns.extend(
            [SUCCESS_COLUMN, ERROR_COLUMN, TIMESTAMP_COLUMN]
                .iter()
                .map(|c| c.to_string()),
        );
        columns
    }

    pub fn to_report(&self) -> Result<TabularReport, ExportError> {
        let columns = self.columns();
        let data_columns = &columns[1..columns.len() - 3];
        let mut report = TabularReport::new(columns.clone());
        for row in &self.rows {
            let mut record = Vec::with_capacity(columns.len());
            record.push(row.case_type().to_string());
            record.extend(data_columns.iter().map(|key| row.cell(key).unwrap_or_default()));
            record.push(row.success().to_string());
            record.push(row.error().to_string());
            record.push(row.timestamp().to_string());
            report.push(record)?;
        }
        Ok(report)
    }

    pub fn write_to(&self, writer: impl Write) -> Result<(), ExportError> {
        self.to_report()?
            .write_to(writer)
            .map_err(|e| ExportError::Csv {
                path: "<writer>".to_string(),
                source: e,
            })
    }

    /// Writes every row to `path`, replacing whatever was there.
    pub fn export(&self, path: &Path) -> Result<(), ExportError> {
        self.to_report()?.write_to_path(path)?;
        info!(path = %path.display(), rows = self.len(), "Results exported");
        Ok(())
    }
}

//! Output formatting for command results.
//!
//! Supports table (human-readable) and JSON output formats. Tables take their
//! columns from the manager that produced the records.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use agentcore_domain::{DataPreview, Result};

/// Placeholder for absent cells
const EMPTY_CELL: &str = "-";

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Render records as rows of `columns`
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized.
    pub fn list<T: Serialize>(&self, columns: &[&str], items: &[T]) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(items)?);
        }

        let rows = items
            .iter()
            .map(|item| {
                let value = serde_json::to_value(item)?;
                Ok(columns.iter().map(|column| cell(value.get(*column))).collect())
            })
            .collect::<Result<Vec<Vec<String>>>>()?;

        if rows.is_empty() {
            return Ok("No results.".to_string());
        }

        let headers: Vec<String> = columns.iter().map(|column| column.to_uppercase()).collect();
        Ok(table(&headers, &rows))
    }

    /// Render one record as `column: value` lines
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn record<T: Serialize>(&self, columns: &[&str], item: &T) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(item)?);
        }

        let value = serde_json::to_value(item)?;
        let width = columns.iter().map(|column| column.len()).max().unwrap_or(0);
        Ok(columns
            .iter()
            .map(|column| {
                let label = format!("{column}:");
                format!("{label:<pad$}  {}", cell(value.get(*column)), pad = width + 1)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Render sample rows; rows may be arrays or objects keyed by column
    ///
    /// # Errors
    ///
    /// Returns an error if the preview cannot be serialized.
    pub fn preview(&self, preview: &DataPreview) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(preview)?);
        }

        let rows: Vec<Vec<String>> = preview
            .rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => {
                    (0..preview.columns.len()).map(|index| cell(cells.get(index))).collect()
                }
                Value::Object(fields) => {
                    preview.columns.iter().map(|column| cell(fields.get(column))).collect()
                }
                other => vec![cell(Some(other))],
            })
            .collect();

        if rows.is_empty() {
            return Ok("No rows.".to_string());
        }
        let headers: Vec<String> =
            preview.columns.iter().map(|column| column.to_uppercase()).collect();
        Ok(table(&headers, &rows))
    }
}

/// Text for one table cell
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::String(text)) if text.is_empty() => EMPTY_CELL.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Left-aligned columns separated by two spaces
fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(value.chars().count());
            }
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(headers)];
    lines.extend(rows.iter().map(|row| render(row)));
    lines.join("\n")
}

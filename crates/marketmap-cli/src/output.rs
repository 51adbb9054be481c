use serde_json::{json, Value};

use marketmap_core::UtcDateTime;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

/// Column layout used by the `table` format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Left-aligned columns padded to the widest cell, two spaces apart.
    pub fn to_lines(&self) -> Vec<String> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(index) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_row = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let pad = width.saturating_sub(cell.chars().count());
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(self.headers.clone()));
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines
    }
}

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let document = document(result);
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            println!("{payload}");
        }
        OutputFormat::Ndjson => {
            for line in ndjson_lines(&result.data)? {
                println!("{line}");
            }
        }
        OutputFormat::Table => {
            for line in result.table.to_lines() {
                println!("{line}");
            }
            if !result.warnings.is_empty() {
                println!("warnings:");
                for warning in &result.warnings {
                    println!("  - {warning}");
                }
            }
        }
    }

    Ok(())
}

fn document(result: &CommandResult) -> Value {
    json!({
        "meta": {
            "generated_at": UtcDateTime::now(),
            "elapsed_ms": result.elapsed_ms,
            "warnings": result.warnings,
        },
        "data": result.data,
    })
}

/// Arrays become one line per element; anything else is a single line.
fn ndjson_lines(data: &Value) -> Result<Vec<String>, CliError> {
    match data {
        Value::Array(items) => items
            .iter()
            .map(|item| serde_json::to_string(item).map_err(CliError::from))
            .collect(),
        other => Ok(vec![serde_json::to_string(other)?]),
    }
}

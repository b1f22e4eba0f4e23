//! Text rendering of query results.

use comfy_table::presets::ASCII_FULL;
use comfy_table::Table;

use crate::db::{ExecutionReport, ResultSet, Value};

/// Text shown for SQL NULL cells.
pub const NULL_TEXT: &str = "NULL";

/// Renders a result as an aligned table followed by the row count and elapsed time.
///
/// Results without columns (DDL, DML) render only the summary.
pub fn render(result: &ResultSet, report: &ExecutionReport) -> String {
    let mut out = String::new();

    if !result.columns.is_empty() {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        table.set_header(result.columns.clone());
        for row in &result.rows {
            table.add_row(row.iter().map(cell_text).collect::<Vec<_>>());
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "Rows: {}\nExecution Time: {:?}\n",
        report.row_count, report.elapsed
    ));
    if report.skipped_rows > 0 {
        out.push_str(&format!(
            "Skipped rows: {} (could not be decoded)\n",
            report.skipped_rows
        ));
    }
    out.push('\n');

    out
}

/// Canonical display form of a single cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_TEXT.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
    }
}

//! Table renderer — formats rows into a table body, and reads tables back
//! out for display or CSV export.

use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use crate::node::{Node, Tag};
use crate::schema::{format_number, json_to_plain, ColumnFormat, ColumnSpec};

/// One data row, keyed by column key.
pub type Row = serde_json::Map<String, Value>;

/// Class marking cells whose source value is numeric.
pub const NUMERIC_CLASS: &str = "num";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no table view for tab '{0}'")]
    MissingTable(String),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Format one cell value.
///
/// - `percent`: ×100, two decimals, `%` suffix
/// - `float`: two decimals
/// - `int`: nearest integer, halves round up
/// - `none`: the value's plain string form
///
/// Non-numeric values ignore the format and render plain.
pub fn format_cell(value: Option<&Value>, format: ColumnFormat) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let Some(n) = value.as_f64() else {
        return json_to_plain(value);
    };
    match format {
        ColumnFormat::Percent => format!("{:.2}%", n * 100.0),
        ColumnFormat::Float => format!("{n:.2}"),
        ColumnFormat::Int => format!("{:.0}", (n + 0.5).floor()),
        ColumnFormat::Raw => format_number(n),
    }
}

/// Replace the table body under `container` with one row per entry.
///
/// `container` may be the tbody itself or any ancestor; a table without a
/// body gets one. The body is rebuilt from scratch on every call. Returns
/// the number of rows written.
pub fn populate_table(container: &mut Node, rows: &[Row], columns: &[ColumnSpec]) -> usize {
    let body = match container.tag {
        Tag::Tbody => container,
        _ => {
            if container.find(&|n| n.tag == Tag::Tbody).is_none() {
                container.children.push(Node::new(Tag::Tbody));
            }
            match container.find_mut(&|n| n.tag == Tag::Tbody) {
                Some(body) => body,
                None => return 0,
            }
        }
    };

    body.children = rows
        .iter()
        .map(|row| {
            Node::new(Tag::Tr).with_children(columns.iter().map(|col| {
                let value = row.get(&col.key);
                let mut td = Node::new(Tag::Td)
                    .with_attr("data-key", col.key.clone())
                    .with_text(format_cell(value, col.format));
                if value.is_some_and(Value::is_number) {
                    td.add_class(NUMERIC_CLASS);
                }
                td
            }))
        })
        .collect();
    body.children.len()
}

/// A table read back from the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub numeric: bool,
}

/// Read header and body text from a table (or any ancestor of one).
pub fn read_table(node: &Node) -> TableSnapshot {
    let Some(table) = node.find(&|n| n.tag == Tag::Table) else {
        return TableSnapshot::default();
    };
    let headers = table
        .find_all(&|n| n.tag == Tag::Th)
        .into_iter()
        .map(Node::text_content)
        .collect();
    let rows = table
        .find(&|n| n.tag == Tag::Tbody)
        .map(|body| {
            body.children
                .iter()
                .map(|tr| {
                    tr.children
                        .iter()
                        .map(|td| Cell {
                            text: td.text_content(),
                            numeric: td.has_class(NUMERIC_CLASS),
                        })
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();
    TableSnapshot { headers, rows }
}

/// Write a table as CSV: header row of column labels, then formatted cells.
pub fn write_csv<W: Write>(snapshot: &TableSnapshot, writer: W) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&snapshot.headers)?;
    for row in &snapshot.rows {
        out.write_record(row.iter().map(|c| c.text.as_str()))?;
    }
    out.flush()?;
    Ok(())
}

//! Flattening of extraction artifacts into tabular export rows.

use serde_json::{Map, Value};

use crate::schema::Transaction;
use crate::session::TableGrid;

/// Column name for a header cell, synthesizing a positional name when the
/// cell is empty or missing.
fn header_name(cell: Option<&Option<String>>, index: usize) -> String {
    match cell.and_then(|c| c.as_deref()) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!("column_{}", index + 1),
    }
}

/// Flattens a table grid into keyed rows. The first row is treated as the
/// header; data rows are zipped against it, with cells beyond the header
/// width getting positional column names.
pub fn table_rows(grid: &TableGrid) -> Vec<Map<String, Value>> {
    let Some((header, data)) = grid.split_first() else {
        return Vec::new();
    };

    data.iter()
        .map(|row| {
            let mut flattened = Map::new();
            for (index, cell) in row.iter().enumerate() {
                let key = header_name(header.get(index), index);
                let value = match cell {
                    Some(text) => Value::String(text.clone()),
                    None => Value::Null,
                };
                flattened.insert(key, value);
            }
            flattened
        })
        .collect()
}

/// Rows for every grid of a document, in page/table order.
pub fn all_table_rows(grids: &[TableGrid]) -> Vec<Map<String, Value>> {
    grids.iter().flat_map(|grid| table_rows(grid)).collect()
}

/// Flattens the reconciled transaction list into export rows.
pub fn transaction_rows(transactions: &[Transaction]) -> Vec<Map<String, Value>> {
    transactions
        .iter()
        .map(|txn| {
            let mut row = Map::new();
            row.insert("date".to_string(), Value::String(txn.date.clone()));
            row.insert(
                "description".to_string(),
                Value::String(txn.description.clone()),
            );
            row.insert("amount".to_string(), Value::from(txn.amount));
            row
        })
        .collect()
}

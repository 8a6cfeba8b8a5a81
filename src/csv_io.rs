//! Delimited text import/export for the product list.
use std::mem::take;

use crate::product::{ImportRecord, Product};

pub const SEPARATOR: char = ',';
pub const HEADER: [&str; 4] = ["barcode", "name", "price", "stock"];

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant). Blank lines are dropped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // escaped quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if is_blank(&row) {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline, even with unterminated quotes.
    row.push(field);
    if !is_blank(&row) {
        rows.push(row);
    }

    rows
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Parses an import file: the first line is a header and is skipped, the
/// remaining rows map to `barcode, name, price, stock`. Missing trailing
/// columns come through empty.
pub fn parse_import(text: &str) -> Vec<ImportRecord> {
    parse_rows(text, SEPARATOR)
        .into_iter()
        .skip(1)
        .map(|row| {
            let mut cells = row.into_iter().map(|cell| cell.trim().to_string());
            ImportRecord {
                barcode: cells.next().unwrap_or_default(),
                name: cells.next().unwrap_or_default(),
                price: cells.next().unwrap_or_default(),
                stock: cells.next().unwrap_or_default(),
            }
        })
        .collect()
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Append a single row, newline-terminated, to `out`.
pub fn push_row<S: AsRef<str>>(out: &mut String, row: &[S], sep: char) {
    for (i, cell) in row.iter().enumerate() {
        let cell = cell.as_ref();
        if i > 0 {
            out.push(sep);
        }
        if needs_quotes(cell, sep) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Full CSV export with header; stock is left empty when untracked.
pub fn export_csv(products: &[Product]) -> String {
    let mut out = String::new();

    push_row(&mut out, &HEADER, SEPARATOR);
    for p in products {
        let price = p.formatted_price();
        let stock = p.stock.map(|s| s.to_string()).unwrap_or_default();
        let row = [p.barcode.as_str(), p.name.as_str(), price.as_str(), stock.as_str()];
        push_row(&mut out, &row, SEPARATOR);
    }

    out
}

/* ---------------- Tabular documents ---------------- */

/// Display rows for PDF/spreadsheet renderers: barcode, name, `$price`, stock.
pub fn table_rows(products: &[Product]) -> Vec<[String; 4]> {
    products
        .iter()
        .map(|p| {
            [
                p.barcode.clone(),
                p.name.clone(),
                format!("${}", p.formatted_price()),
                p.stock.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect()
}

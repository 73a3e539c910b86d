//! Plain-text report rendering.
//!
//! Bordered tables in the familiar `+---+` / `| cell |` layout. The same
//! rendering is printed to the console (with coloured change markers)
//! and written to the report file (uncoloured, so the next run can parse
//! it back as its snapshot).

use rust_decimal::Decimal;
use std::fmt::Write as _;

use crate::types::{ChangeMarker, Price, Valuation, ValuationRow};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A left-aligned text table with column widths fitted to content.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with empty cells.
    pub fn add_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render without styling.
    pub fn render(&self) -> String {
        self.render_with(|_, cell| cell.to_string())
    }

    /// Render, passing every padded body cell through `paint(column, cell)`.
    /// Widths are measured before painting, so escape codes don't skew them.
    pub fn render_with(&self, paint: impl Fn(usize, &str) -> String) -> String {
        let widths = self.widths();
        let rule = widths.iter().fold(String::from("+"), |mut s, w| {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
            s
        });

        let line = |cells: &[String], painted: bool| {
            let mut out = String::from("|");
            for (i, cell) in cells.iter().enumerate() {
                let pad = widths[i] - cell.chars().count();
                let padded = format!("{cell}{}", " ".repeat(pad));
                let padded = if painted { paint(i, &padded) } else { padded };
                let _ = write!(out, " {padded} |");
            }
            out
        };

        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", line(&self.headers[..], false));
        let _ = writeln!(out, "{rule}");
        for row in &self.rows {
            let _ = writeln!(out, "{}", line(&row[..], true));
        }
        let _ = writeln!(out, "{rule}");
        out
    }
}

// ---------------------------------------------------------------------------
// Valuation report
// ---------------------------------------------------------------------------

/// Column index of the change marker in the item table.
const CHANGE_COLUMN: usize = 6;

fn secondary(label: &str, amount: Decimal) -> String {
    format!("{label} {amount:.2}")
}

fn item_cells(row: &ValuationRow, label: &str) -> Vec<String> {
    vec![
        row.name.clone(),
        row.count.to_string(),
        Price::new(row.unit_usd).to_string(),
        secondary(label, row.unit_secondary),
        Price::new(row.total_usd).to_string(),
        secondary(label, row.total_secondary),
        row.change.symbol().to_string(),
    ]
}

/// Per-item table, rows in valuation order.
pub fn item_table(valuation: &Valuation) -> Table {
    let label = &valuation.secondary_currency;
    let mut table = Table::new([
        "Item Name".to_string(),
        "Count".to_string(),
        "Price per One (USD)".to_string(),
        format!("Price per One ({label})"),
        "Price for All (USD)".to_string(),
        format!("Price for All ({label})"),
        "Change".to_string(),
    ]);
    for row in &valuation.rows {
        table.add_row(item_cells(row, label));
    }
    table
}

/// Single-row inventory totals table.
pub fn totals_table(valuation: &Valuation) -> Table {
    let label = &valuation.secondary_currency;
    let mut table = Table::new([
        "Total Inventory Value (USD)".to_string(),
        format!("Total Inventory Value ({label})"),
    ]);
    table.add_row([
        Price::new(valuation.total_usd).to_string(),
        secondary(label, valuation.total_secondary),
    ]);
    table
}

fn paint_marker(column: usize, cell: &str) -> String {
    if column != CHANGE_COLUMN {
        return cell.to_string();
    }
    let increase = ChangeMarker::Increase.symbol();
    let decrease = ChangeMarker::Decrease.symbol();
    if cell.contains(increase) {
        cell.replacen(increase, &format!("{GREEN}{increase}{RESET}"), 1)
    } else if cell.contains(decrease) {
        cell.replacen(decrease, &format!("{RED}{decrease}{RESET}"), 1)
    } else {
        cell.to_string()
    }
}

/// Both tables, item table first. `colour` adds ANSI colour to the
/// change markers for terminal output.
pub fn render_report(valuation: &Valuation, colour: bool) -> String {
    let items = item_table(valuation);
    let items = if colour {
        items.render_with(paint_marker)
    } else {
        items.render()
    };
    format!("{items}{}", totals_table(valuation).render())
}

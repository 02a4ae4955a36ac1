//! Terminal rendering of result tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Table};
use polars::prelude::*;

use crate::pipeline::binning::{ConsolidatedTable, TOTAL_LABEL};

/// Render a consolidated WOE/IV table, totals row last. WOE stays blank
/// on the totals row, where it is undefined.
pub fn render_consolidated(table: &ConsolidatedTable) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_header(vec![
        Cell::new("categoria").add_attribute(Attribute::Bold),
        Cell::new("N_total").add_attribute(Attribute::Bold),
        Cell::new("N_bons").add_attribute(Attribute::Bold),
        Cell::new("N_maus").add_attribute(Attribute::Bold),
        Cell::new("tx_default").add_attribute(Attribute::Bold),
        Cell::new("P_bons").add_attribute(Attribute::Bold),
        Cell::new("P_maus").add_attribute(Attribute::Bold),
        Cell::new("WOE").add_attribute(Attribute::Bold),
        Cell::new("IV").add_attribute(Attribute::Bold),
    ]);

    for row in &table.rows {
        out.add_row(vec![
            Cell::new(&row.label),
            Cell::new(row.n_total),
            Cell::new(row.n_bons),
            Cell::new(row.n_maus),
            Cell::new(format!("{:.4}", row.tx_default)),
            Cell::new(format!("{:.4}", row.p_bons)),
            Cell::new(format!("{:.4}", row.p_maus)),
            Cell::new(format!("{:.4}", row.woe)),
            Cell::new(format!("{:.4}", row.iv)),
        ]);
    }

    let tx_total = if table.n_total > 0 {
        format!("{:.4}", table.n_maus as f64 / table.n_total as f64)
    } else {
        String::new()
    };
    out.add_row(vec![
        Cell::new(TOTAL_LABEL).add_attribute(Attribute::Bold),
        Cell::new(table.n_total).add_attribute(Attribute::Bold),
        Cell::new(table.n_bons),
        Cell::new(table.n_maus),
        Cell::new(tx_total),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.4}", table.iv_total)).add_attribute(Attribute::Bold),
    ]);
    out
}

/// Render an arbitrary DataFrame as a terminal table.
pub fn render_frame(df: &DataFrame) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_header(
        df.get_column_names()
            .iter()
            .map(|name| Cell::new(name.as_str()).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    let columns = df.get_columns();
    for i in 0..df.height() {
        let row: Vec<Cell> = columns
            .iter()
            .map(|col| Cell::new(stringify(col.get(i).unwrap_or(AnyValue::Null))))
            .collect();
        out.add_row(row);
    }
    out
}

fn stringify(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{:.4}", v),
        AnyValue::Float32(v) => format!("{:.4}", v),
        AnyValue::String(v) => v.to_string(),
        AnyValue::StringOwned(ref v) => v.to_string(),
        other => other.to_string(),
    }
}

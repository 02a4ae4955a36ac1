//! Windowed feature families and cross-window comparators
//!
//! Each family takes the delinquency rows and the shared history index
//! and returns a DataFrame keyed by (id_cliente, data_referencia), one
//! row per delinquency row, computed in parallel.

pub mod compare;
pub mod customer;
pub mod flags;
pub mod quantity;
pub mod time;
pub mod value;

pub use compare::{delta, delta_opt, ratio, ratio_opt, round_to};
pub use customer::{cadastral_features, relationship_features};
pub use flags::flag_features;
pub use quantity::quantity_features;
pub use time::time_features;
pub use value::value_features;

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;

use super::preprocess::{DelinquencyRow, ID_COL, REF_COL};

/// Key columns shared by every windowed feature table.
pub(crate) fn key_columns(rows: &[DelinquencyRow]) -> Vec<Column> {
    let ids: Vec<String> = rows.iter().map(|r| r.id_cliente.clone()).collect();
    let refs: Vec<String> = rows.iter().map(|r| r.data_referencia.to_string()).collect();
    vec![
        Column::new(ID_COL.into(), ids),
        Column::new(REF_COL.into(), refs),
    ]
}

/// Progress bar for a per-row feature pass.
pub(crate) fn feature_progress(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "   {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} rows ({{percent}}%) [{{eta}}]",
                label
            ))
            .unwrap()
            .progress_chars("=>-"),
    );
    pb
}

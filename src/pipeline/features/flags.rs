//! Transaction-existence flags per window
//!
//! `flag_nunca_transacionou` is 1 when the customer has no usable history
//! at the cutoff (absent from the log, or nothing dated at or before it).
//! `flag_transacao_Xm` is 1 when the window holds at least one
//! transaction, 0 when the customer has history but the window is empty,
//! and missing when there is no available history to judge against.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;

use super::super::calendar::{cutoff_date, window_bounds, Window};
use super::super::history::{window_slice, HistoryIndex};
use super::super::preprocess::DelinquencyRow;
use super::{feature_progress, key_columns};

#[derive(Debug, Clone, Copy)]
struct FlagRow {
    never: i32,
    windows: [Option<i32>; 7],
}

/// Compute the existence-flag feature family, one output row per
/// delinquency row.
pub fn flag_features(
    rows: &[DelinquencyRow],
    index: &HistoryIndex,
    use_prior_month: bool,
) -> Result<DataFrame> {
    let pb = feature_progress(rows.len() as u64, "Flag features    ");
    let counter = AtomicU64::new(0);

    let computed: Vec<FlagRow> = rows
        .par_iter()
        .map(|row| {
            let feats = compute_row(row, index, use_prior_month);
            let done = counter.fetch_add(1, Ordering::Relaxed);
            if done % 256 == 0 {
                pb.set_position(done + 1);
            }
            feats
        })
        .collect();
    pb.finish_and_clear();

    let mut columns = key_columns(rows);
    columns.push(Column::new(
        "flag_nunca_transacionou".into(),
        computed.iter().map(|r| r.never).collect::<Vec<_>>(),
    ));
    for window in Window::ALL {
        let i = window.position();
        columns.push(Column::new(
            format!("flag_transacao_{}", window.label()).into(),
            computed.iter().map(|r| r.windows[i]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

fn compute_row(row: &DelinquencyRow, index: &HistoryIndex, use_prior_month: bool) -> FlagRow {
    let cutoff = cutoff_date(row.data_referencia, use_prior_month);
    let available = index.available(&row.id_cliente, cutoff);

    let mut feats = FlagRow {
        never: if available.is_empty() { 1 } else { 0 },
        windows: [None; 7],
    };
    if available.is_empty() {
        return feats;
    }

    for window in Window::ALL {
        let (start, _) = window_bounds(cutoff, window.months());
        let slice = window_slice(available, start);
        feats.windows[window.position()] = Some(if slice.is_empty() { 0 } else { 1 });
    }
    feats
}

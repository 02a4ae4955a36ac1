//! Transaction-value features per window
//!
//! Per delinquency row: the summed transaction value in each window
//! (`vlr_trans_1m` ... `vlr_trans_ever`), the last/maximum/minimum value
//! over the available history, and the adjacent-window ratio and delta
//! comparisons.
//!
//! Conventions: every statistic is missing for a customer absent from the
//! transaction log; a customer with history but an empty window gets a 0
//! sum, while last/max/min stay missing only when the available history
//! itself is empty.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;

use super::super::calendar::{cutoff_date, window_bounds, Window, ADJACENT_PAIRS};
use super::super::history::{window_slice, HistoryIndex};
use super::super::preprocess::DelinquencyRow;
use super::compare::{delta_opt, ratio_opt};
use super::{feature_progress, key_columns};

#[derive(Debug, Clone, Copy, Default)]
struct ValueRow {
    sums: [Option<f64>; 7],
    ult: Option<f64>,
    max: Option<f64>,
    min: Option<f64>,
    comps: [Option<f64>; 6],
    deltas: [Option<f64>; 6],
}

/// Compute the value feature family, one output row per delinquency row.
pub fn value_features(
    rows: &[DelinquencyRow],
    index: &HistoryIndex,
    use_prior_month: bool,
) -> Result<DataFrame> {
    let pb = feature_progress(rows.len() as u64, "Value features   ");
    let counter = AtomicU64::new(0);

    let computed: Vec<ValueRow> = rows
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
    for window in Window::ALL {
        let i = window.position();
        columns.push(Column::new(
            format!("vlr_trans_{}", window.label()).into(),
            computed.iter().map(|r| r.sums[i]).collect::<Vec<_>>(),
        ));
    }
    columns.push(Column::new(
        "vlr_trans_ult".into(),
        computed.iter().map(|r| r.ult).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "vlr_trans_max".into(),
        computed.iter().map(|r| r.max).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "vlr_trans_min".into(),
        computed.iter().map(|r| r.min).collect::<Vec<_>>(),
    ));
    for (i, (a, b)) in ADJACENT_PAIRS.iter().enumerate() {
        columns.push(Column::new(
            format!("comp_vlr_{}_vs_{}", a.label(), b.label()).into(),
            computed.iter().map(|r| r.comps[i]).collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            format!("delta_vlr_{}_vs_{}", a.label(), b.label()).into(),
            computed.iter().map(|r| r.deltas[i]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

fn compute_row(row: &DelinquencyRow, index: &HistoryIndex, use_prior_month: bool) -> ValueRow {
    if !index.contains(&row.id_cliente) {
        return ValueRow::default();
    }

    let cutoff = cutoff_date(row.data_referencia, use_prior_month);
    let available = index.available(&row.id_cliente, cutoff);

    let mut feats = ValueRow::default();
    for window in Window::ALL {
        let (start, _) = window_bounds(cutoff, window.months());
        let slice = window_slice(available, start);
        let total: f64 = slice.iter().filter_map(|e| e.value).sum();
        feats.sums[window.position()] = Some(total);
    }

    feats.ult = available.last().and_then(|e| e.value);
    for value in available.iter().filter_map(|e| e.value) {
        feats.max = Some(feats.max.map_or(value, |m: f64| m.max(value)));
        feats.min = Some(feats.min.map_or(value, |m: f64| m.min(value)));
    }

    for (i, (a, b)) in ADJACENT_PAIRS.iter().enumerate() {
        let v1 = feats.sums[a.position()];
        let v2 = feats.sums[b.position()];
        feats.comps[i] = ratio_opt(v1, v2);
        feats.deltas[i] = delta_opt(v1, v2);
    }
    feats
}

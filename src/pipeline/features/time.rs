//! Elapsed-time features per window
//!
//! `tempo_desde_primeira_Xm` and `tempo_desde_ultima_Xm` measure the days
//! from the cutoff back to the earliest and latest transaction in the
//! window; `tempo_atividade_Xm` is their difference (0 means a single
//! transaction or an exact-cutoff hit, positive means spread activity,
//! missing means an empty window).

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;

use super::super::calendar::{cutoff_date, window_bounds, Window};
use super::super::history::{window_slice, HistoryIndex};
use super::super::preprocess::DelinquencyRow;
use super::{feature_progress, key_columns};

#[derive(Debug, Clone, Copy, Default)]
struct TimeRow {
    since_first: [Option<f64>; 7],
    since_last: [Option<f64>; 7],
    activity: [Option<f64>; 7],
}

/// Compute the elapsed-time feature family, one output row per
/// delinquency row.
pub fn time_features(
    rows: &[DelinquencyRow],
    index: &HistoryIndex,
    use_prior_month: bool,
) -> Result<DataFrame> {
    let pb = feature_progress(rows.len() as u64, "Time features    ");
    let counter = AtomicU64::new(0);

    let computed: Vec<TimeRow> = rows
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
            format!("tempo_desde_primeira_{}", window.label()).into(),
            computed.iter().map(|r| r.since_first[i]).collect::<Vec<_>>(),
        ));
    }
    for window in Window::ALL {
        let i = window.position();
        columns.push(Column::new(
            format!("tempo_desde_ultima_{}", window.label()).into(),
            computed.iter().map(|r| r.since_last[i]).collect::<Vec<_>>(),
        ));
    }
    for window in Window::ALL {
        let i = window.position();
        columns.push(Column::new(
            format!("tempo_atividade_{}", window.label()).into(),
            computed.iter().map(|r| r.activity[i]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

fn compute_row(row: &DelinquencyRow, index: &HistoryIndex, use_prior_month: bool) -> TimeRow {
    if !index.contains(&row.id_cliente) {
        return TimeRow::default();
    }

    let cutoff = cutoff_date(row.data_referencia, use_prior_month);
    let available = index.available(&row.id_cliente, cutoff);

    let mut feats = TimeRow::default();
    for window in Window::ALL {
        let (start, _) = window_bounds(cutoff, window.months());
        let slice = window_slice(available, start);
        if let (Some(first), Some(last)) = (slice.first(), slice.last()) {
            let i = window.position();
            let since_first = (cutoff - first.date).num_days() as f64;
            let since_last = (cutoff - last.date).num_days() as f64;
            feats.since_first[i] = Some(since_first);
            feats.since_last[i] = Some(since_last);
            feats.activity[i] = Some(since_first - since_last);
        }
    }
    feats
}

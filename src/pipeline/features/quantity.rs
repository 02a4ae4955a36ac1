//! Transaction-count features per window
//!
//! `qtde_trans_Xm` counts transactions in each window, `pct_qtde_trans_Xm`
//! expresses each count as a percentage of the all-history count, and the
//! adjacent-window ratio/delta comparisons follow the same rule as the
//! value family. Counts are 0 for an empty window when the customer has
//! history; everything is missing for a customer absent from the log.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;

use super::super::calendar::{cutoff_date, window_bounds, Window, ADJACENT_PAIRS};
use super::super::history::{window_slice, HistoryIndex};
use super::super::preprocess::DelinquencyRow;
use super::compare::{delta_opt, ratio_opt, round_to};
use super::{feature_progress, key_columns};

#[derive(Debug, Clone, Copy, Default)]
struct QuantityRow {
    counts: [Option<f64>; 7],
    pcts: [Option<f64>; 7],
    comps: [Option<f64>; 6],
    deltas: [Option<f64>; 6],
}

/// Compute the quantity feature family, one output row per delinquency row.
pub fn quantity_features(
    rows: &[DelinquencyRow],
    index: &HistoryIndex,
    use_prior_month: bool,
) -> Result<DataFrame> {
    let pb = feature_progress(rows.len() as u64, "Quantity features");
    let counter = AtomicU64::new(0);

    let computed: Vec<QuantityRow> = rows
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
            format!("qtde_trans_{}", window.label()).into(),
            computed.iter().map(|r| r.counts[i]).collect::<Vec<_>>(),
        ));
    }
    for window in Window::ALL {
        let i = window.position();
        columns.push(Column::new(
            format!("pct_qtde_trans_{}", window.label()).into(),
            computed.iter().map(|r| r.pcts[i]).collect::<Vec<_>>(),
        ));
    }
    for (i, (a, b)) in ADJACENT_PAIRS.iter().enumerate() {
        columns.push(Column::new(
            format!("comp_qtde_{}_vs_{}", a.label(), b.label()).into(),
            computed.iter().map(|r| r.comps[i]).collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            format!("delta_qtde_{}_vs_{}", a.label(), b.label()).into(),
            computed.iter().map(|r| r.deltas[i]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

fn compute_row(row: &DelinquencyRow, index: &HistoryIndex, use_prior_month: bool) -> QuantityRow {
    if !index.contains(&row.id_cliente) {
        return QuantityRow::default();
    }

    let cutoff = cutoff_date(row.data_referencia, use_prior_month);
    let available = index.available(&row.id_cliente, cutoff);

    let mut feats = QuantityRow::default();
    for window in Window::ALL {
        let (start, _) = window_bounds(cutoff, window.months());
        let slice = window_slice(available, start);
        feats.counts[window.position()] = Some(slice.len() as f64);
    }

    let ever = feats.counts[Window::Ever.position()].unwrap_or(0.0);
    for window in Window::ALL {
        let i = window.position();
        feats.pcts[i] = if ever == 0.0 {
            None
        } else {
            feats.counts[i].map(|v| round_to(100.0 * v / ever, 2))
        };
    }

    for (i, (a, b)) in ADJACENT_PAIRS.iter().enumerate() {
        let v1 = feats.counts[a.position()];
        let v2 = feats.counts[b.position()];
        feats.comps[i] = ratio_opt(v1, v2);
        feats.deltas[i] = delta_opt(v1, v2);
    }
    feats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::preprocess::Transaction;
    use chrono::NaiveDate;

    fn tx(id: &str, date: &str) -> Transaction {
        Transaction {
            id_cliente: id.to_string(),
            data_transacao: Some(date.parse().unwrap()),
            mes_safra: None,
            valor_transacao: Some(10.0),
        }
    }

    fn obs(id: &str, reference: &str) -> DelinquencyRow {
        DelinquencyRow {
            id_cliente: id.to_string(),
            mes_safra: reference[..7].to_string(),
            data_referencia: reference.parse::<NaiveDate>().unwrap(),
            atraso_90d: Some(0),
        }
    }

    fn col_f64(df: &DataFrame, name: &str, row: usize) -> Option<f64> {
        df.column(name).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_window_counts_are_nested() {
        let index = HistoryIndex::build(&[
            tx("C1", "2022-05-10"),
            tx("C1", "2023-11-02"),
            tx("C1", "2024-01-15"),
            tx("C1", "2024-03-04"),
            tx("C1", "2024-03-23"),
        ]);
        let rows = vec![obs("C1", "2024-04-30")];

        let df = quantity_features(&rows, &index, true).unwrap();
        let mut prev = f64::INFINITY;
        for window in Window::ALL.iter().rev() {
            let count = col_f64(&df, &format!("qtde_trans_{}", window.label()), 0).unwrap();
            assert!(
                count <= prev,
                "{} count {} should not exceed the longer window's {}",
                window.label(),
                count,
                prev
            );
            prev = count;
        }
        assert_eq!(col_f64(&df, "qtde_trans_ever", 0), Some(5.0));
        assert_eq!(col_f64(&df, "qtde_trans_1m", 0), Some(2.0));
    }

    #[test]
    fn test_pct_of_ever() {
        let index = HistoryIndex::build(&[
            tx("C1", "2023-01-10"),
            tx("C1", "2024-03-04"),
            tx("C1", "2024-03-23"),
            tx("C1", "2023-06-15"),
        ]);
        let rows = vec![obs("C1", "2024-04-30")];

        let df = quantity_features(&rows, &index, true).unwrap();
        assert_eq!(col_f64(&df, "pct_qtde_trans_1m", 0), Some(50.0));
        assert_eq!(col_f64(&df, "pct_qtde_trans_ever", 0), Some(100.0));
    }

    #[test]
    fn test_pct_missing_when_no_available_history() {
        // Customer is in the log, but the only transaction is after the cutoff
        let index = HistoryIndex::build(&[tx("C1", "2024-04-22")]);
        let rows = vec![obs("C1", "2024-04-30")];

        let df = quantity_features(&rows, &index, true).unwrap();
        assert_eq!(col_f64(&df, "qtde_trans_ever", 0), Some(0.0));
        assert_eq!(col_f64(&df, "pct_qtde_trans_1m", 0), None);
        // Both counts zero: comparison is missing, delta is 0
        assert_eq!(col_f64(&df, "comp_qtde_1m_vs_3m", 0), None);
        assert_eq!(col_f64(&df, "delta_qtde_1m_vs_3m", 0), Some(0.0));
    }

    #[test]
    fn test_absent_customer_all_missing() {
        let index = HistoryIndex::build(&[tx("C1", "2024-03-04")]);
        let rows = vec![obs("C9", "2024-04-30")];

        let df = quantity_features(&rows, &index, true).unwrap();
        assert_eq!(col_f64(&df, "qtde_trans_1m", 0), None);
        assert_eq!(col_f64(&df, "pct_qtde_trans_1m", 0), None);
        assert_eq!(col_f64(&df, "delta_qtde_1m_vs_3m", 0), None);
    }
}

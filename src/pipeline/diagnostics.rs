//! ABT diagnostics: per-column profile and IV ranking
//!
//! The exclusion list (key columns, target, anything the caller wants
//! ignored) is explicit configuration threaded through both entry
//! points, not an ambient global.

use anyhow::Result;
use polars::prelude::*;

use super::binning::{ks_statistic, variable_iv, KsResult};
use super::preprocess::{numeric_values, ID_COL, REF_COL, SAFRA_COL};

/// Configuration for diagnostics and variable ranking.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Columns excluded from profiling and ranking (keys, labels, the
    /// target itself is excluded implicitly where relevant).
    pub exclude: Vec<String>,
    /// Quantile buckets used for the IV ranking.
    pub buckets: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                ID_COL.to_string(),
                SAFRA_COL.to_string(),
                REF_COL.to_string(),
            ],
            buckets: 10,
        }
    }
}

/// Per-column profile: dtype, missing percentage, cardinality, and basic
/// numeric summaries. Sorted by missing percentage descending.
pub fn diagnose_abt(df: &DataFrame, config: &DiagnosticsConfig) -> Result<DataFrame> {
    let mut names: Vec<String> = Vec::new();
    let mut dtypes: Vec<String> = Vec::new();
    let mut pct_missing: Vec<f64> = Vec::new();
    let mut n_unique: Vec<u32> = Vec::new();
    let mut means: Vec<Option<f64>> = Vec::new();
    let mut mins: Vec<Option<f64>> = Vec::new();
    let mut maxs: Vec<Option<f64>> = Vec::new();

    let height = df.height().max(1);
    for col in df.get_columns() {
        let name = col.name().to_string();
        if config.exclude.contains(&name) {
            continue;
        }

        names.push(name);
        dtypes.push(col.dtype().to_string());
        pct_missing.push(round2(100.0 * col.null_count() as f64 / height as f64));
        n_unique.push(col.as_materialized_series().n_unique()? as u32);

        if col.dtype().is_primitive_numeric() {
            let values = numeric_values(col)?;
            let non_null: Vec<f64> = values.into_iter().flatten().collect();
            if non_null.is_empty() {
                means.push(None);
                mins.push(None);
                maxs.push(None);
            } else {
                let sum: f64 = non_null.iter().sum();
                means.push(Some(sum / non_null.len() as f64));
                mins.push(non_null.iter().copied().fold(None, fold_min));
                maxs.push(non_null.iter().copied().fold(None, fold_max));
            }
        } else {
            means.push(None);
            mins.push(None);
            maxs.push(None);
        }
    }

    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by(|a, b| {
        pct_missing[*b]
            .partial_cmp(&pct_missing[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let columns = vec![
        Column::new(
            "variavel".into(),
            order.iter().map(|&i| names[i].clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "tipo".into(),
            order.iter().map(|&i| dtypes[i].clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "pct_missing".into(),
            order.iter().map(|&i| pct_missing[i]).collect::<Vec<_>>(),
        ),
        Column::new(
            "n_unique".into(),
            order.iter().map(|&i| n_unique[i]).collect::<Vec<_>>(),
        ),
        Column::new(
            "media".into(),
            order.iter().map(|&i| means[i]).collect::<Vec<_>>(),
        ),
        Column::new(
            "min".into(),
            order.iter().map(|&i| mins[i]).collect::<Vec<_>>(),
        ),
        Column::new(
            "max".into(),
            order.iter().map(|&i| maxs[i]).collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Rank numeric variables by IV against the target, descending.
/// Variables whose IV cannot be computed (degenerate target split) are
/// skipped rather than reported as zero.
pub fn iv_ranking(
    df: &DataFrame,
    target: &str,
    config: &DiagnosticsConfig,
) -> Result<Vec<(String, f64)>> {
    let target_values: Vec<Option<i32>> = numeric_values(df.column(target)?)?
        .into_iter()
        .map(|v| v.map(|x| if x >= 1.0 { 1 } else { 0 }))
        .collect();

    let mut ranking: Vec<(String, f64)> = Vec::new();
    for col in df.get_columns() {
        let name = col.name().to_string();
        if name == target || config.exclude.contains(&name) || !col.dtype().is_primitive_numeric()
        {
            continue;
        }
        let values = numeric_values(col)?;
        if let Some(iv) = variable_iv(&values, &target_values, config.buckets) {
            ranking.push((name, iv));
        }
    }
    ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranking)
}

/// KS of one variable used as a score against the target, over the rows
/// where both are present.
pub fn variable_ks(values: &[Option<f64>], target: &[Option<i32>]) -> Option<KsResult> {
    let mut scores = Vec::new();
    let mut outcomes = Vec::new();
    for (value, outcome) in values.iter().zip(target.iter()) {
        if let (Some(v), Some(t)) = (value, outcome) {
            scores.push(*v);
            outcomes.push(*t);
        }
    }
    ks_statistic(&scores, &outcomes)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn fold_min(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

fn fold_max(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

//! Quantile binning, consolidated WOE/IV tables, regrouping and KS
//!
//! Discretization assigns every row a category label: quantile interval
//! labels for non-missing values and the `-99` sentinel for missing ones.
//! The consolidated table computes per-category counts, default rates,
//! WOE and IV, with a totals row; regrouping maps initial labels to final
//! group labels and recomputes the same table.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};
use polars::prelude::*;

use super::preprocess::string_values;

/// Category label given to missing values.
pub const MISSING_LABEL: &str = "-99";

/// Label of the totals row in a consolidated table.
pub const TOTAL_LABEL: &str = "TOTAL";

/// One category of a consolidated table.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub label: String,
    pub n_total: u32,
    pub n_bons: u32,
    pub n_maus: u32,
    pub tx_default: f64,
    pub tx_n_default: f64,
    pub p_bons: f64,
    pub p_maus: f64,
    pub woe: f64,
    pub iv: f64,
}

/// Consolidated WOE/IV table over the categories of one variable.
#[derive(Debug, Clone)]
pub struct ConsolidatedTable {
    pub rows: Vec<CategoryRow>,
    pub n_total: u32,
    pub n_bons: u32,
    pub n_maus: u32,
    pub iv_total: f64,
}

/// Assign quantile-bucket labels to a continuous variable. Missing
/// values get the `-99` sentinel. When the quantile edges collapse
/// (too few distinct values for the requested bucket count), raw values
/// become the bucket keys.
pub fn quantile_categories(values: &[Option<f64>], buckets: usize) -> Vec<String> {
    let mut non_null: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    non_null.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let edges = quantile_edges(&non_null, buckets);
    if edges.len() < 2 {
        // Raw-value fallback
        return values
            .iter()
            .map(|v| match v {
                Some(value) => format!("{}", value),
                None => MISSING_LABEL.to_string(),
            })
            .collect();
    }

    values
        .iter()
        .map(|v| match v {
            Some(value) => interval_label(*value, &edges),
            None => MISSING_LABEL.to_string(),
        })
        .collect()
}

/// Deduplicated quantile edges (linear interpolation) over sorted values.
fn quantile_edges(sorted: &[f64], buckets: usize) -> Vec<f64> {
    if sorted.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let n = sorted.len();
    let mut edges = Vec::with_capacity(buckets + 1);
    for i in 0..=buckets {
        let pos = (i as f64 / buckets as f64) * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let value = if lo == hi {
            sorted[lo]
        } else {
            sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
        };
        if edges.last().map_or(true, |last: &f64| value > *last) {
            edges.push(value);
        }
    }
    edges
}

/// Interval label for a value against the bucket edges: `(lo, hi]`
/// half-open buckets, with the first bucket closed on both sides.
fn interval_label(value: f64, edges: &[f64]) -> String {
    for i in 1..edges.len() {
        if value <= edges[i] || i == edges.len() - 1 {
            return format!("({:.3}, {:.3}]", edges[i - 1], edges[i]);
        }
    }
    format!("({:.3}, {:.3}]", edges[edges.len() - 2], edges[edges.len() - 1])
}

/// Apply a manual regrouping: initial labels map to final group labels,
/// unmapped labels keep themselves.
pub fn regroup(categories: &[String], mapping: &HashMap<String, String>) -> Vec<String> {
    categories
        .iter()
        .map(|c| mapping.get(c).cloned().unwrap_or_else(|| c.clone()))
        .collect()
}

/// Build the consolidated WOE/IV table for categorized observations.
/// Rows with a null target are left out of every count. WOE is
/// ln(P_bons / P_maus), forced to 0 when either proportion is zero so a
/// one-sided category contributes no infinite evidence.
pub fn consolidate(categories: &[String], target: &[Option<i32>]) -> ConsolidatedTable {
    let mut counts: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for (label, outcome) in categories.iter().zip(target.iter()) {
        if let Some(outcome) = outcome {
            let entry = counts.entry(label.as_str()).or_insert((0, 0));
            if *outcome >= 1 {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }
    }

    let total_bons: u32 = counts.values().map(|(b, _)| b).sum();
    let total_maus: u32 = counts.values().map(|(_, m)| m).sum();

    let mut rows: Vec<CategoryRow> = counts
        .into_iter()
        .map(|(label, (n_bons, n_maus))| {
            let n_total = n_bons + n_maus;
            let p_bons = proportion(n_bons, total_bons);
            let p_maus = proportion(n_maus, total_maus);
            let woe = if p_bons > 0.0 && p_maus > 0.0 {
                (p_bons / p_maus).ln()
            } else {
                0.0
            };
            CategoryRow {
                label: label.to_string(),
                n_total,
                n_bons,
                n_maus,
                tx_default: rate(n_maus, n_total).unwrap_or(0.0),
                tx_n_default: rate(n_bons, n_total).unwrap_or(0.0),
                p_bons,
                p_maus,
                woe,
                iv: (p_bons - p_maus) * woe,
            }
        })
        .collect();
    rows.sort_by(|a, b| category_order(&a.label, &b.label));

    let iv_total = rows.iter().map(|r| r.iv).sum();
    ConsolidatedTable {
        rows,
        n_total: total_bons + total_maus,
        n_bons: total_bons,
        n_maus: total_maus,
        iv_total,
    }
}

/// IV of a continuous variable after quantile categorization; `None`
/// when the table degenerates (no goods or no bads).
pub fn variable_iv(values: &[Option<f64>], target: &[Option<i32>], buckets: usize) -> Option<f64> {
    let categories = quantile_categories(values, buckets);
    let table = consolidate(&categories, target);
    if table.n_bons == 0 || table.n_maus == 0 {
        None
    } else {
        Some(table.iv_total)
    }
}

/// Result of a KS scan: the maximum gap and the score where it occurs.
#[derive(Debug, Clone, Copy)]
pub struct KsResult {
    pub ks: f64,
    pub score: f64,
}

/// Kolmogorov-Smirnov statistic of a score against a binary outcome:
/// rank ascending by score, accumulate good/bad proportions, report the
/// largest absolute gap. `None` when either class is absent.
pub fn ks_statistic(scores: &[f64], target: &[i32]) -> Option<KsResult> {
    let total_bons = target.iter().filter(|t| **t == 0).count() as f64;
    let total_maus = target.iter().filter(|t| **t >= 1).count() as f64;
    if total_bons == 0.0 || total_maus == 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| {
        scores[*a]
            .partial_cmp(&scores[*b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut cum_bons = 0.0;
    let mut cum_maus = 0.0;
    let mut best = KsResult { ks: 0.0, score: scores[order[0]] };
    for idx in order {
        if target[idx] >= 1 {
            cum_maus += 1.0;
        } else {
            cum_bons += 1.0;
        }
        let gap = (cum_maus / total_maus - cum_bons / total_bons).abs();
        if gap > best.ks {
            best = KsResult {
                ks: gap,
                score: scores[idx],
            };
        }
    }
    Some(best)
}

/// Default rate per (safra, category), the tabular form of the
/// per-category time-series view.
pub fn default_rate_by_safra(
    safras: &[String],
    categories: &[String],
    target: &[Option<i32>],
) -> Result<DataFrame> {
    let mut groups: BTreeMap<(&str, &str), (u32, u32)> = BTreeMap::new();
    for ((safra, label), outcome) in safras.iter().zip(categories.iter()).zip(target.iter()) {
        if let Some(outcome) = outcome {
            let entry = groups
                .entry((safra.as_str(), label.as_str()))
                .or_insert((0, 0));
            entry.0 += 1;
            if *outcome >= 1 {
                entry.1 += 1;
            }
        }
    }

    let mut safra_col = Vec::with_capacity(groups.len());
    let mut cat_col = Vec::with_capacity(groups.len());
    let mut rate_col = Vec::with_capacity(groups.len());
    for ((safra, label), (n, maus)) in groups {
        safra_col.push(safra.to_string());
        cat_col.push(label.to_string());
        rate_col.push(maus as f64 / n as f64);
    }

    let columns = vec![
        Column::new("mes_safra".into(), safra_col),
        Column::new("categoria".into(), cat_col),
        Column::new("tx_default".into(), rate_col),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Reject a target column with more than two distinct non-null values
/// before any session work begins.
pub fn validate_binary_target(df: &DataFrame, target: &str) -> Result<()> {
    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;
    let values = string_values(col)?;
    let distinct: HashSet<&String> = values.iter().flatten().collect();
    if distinct.len() > 2 {
        let mut sample: Vec<String> = distinct.iter().take(5).map(|s| s.to_string()).collect();
        sample.sort();
        anyhow::bail!(
            "Target column '{}' has {} distinct values (need a binary 0/1 column): {:?}",
            target,
            distinct.len(),
            sample
        );
    }
    Ok(())
}

fn proportion(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn rate(part: u32, whole: u32) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

/// Categories sort numerically when their label starts with a number
/// (raw-value fallback) or an interval bound, lexicographically
/// otherwise; the missing sentinel always sorts last.
fn category_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a == MISSING_LABEL, b == MISSING_LABEL) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => match (leading_number(a), leading_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            _ => a.cmp(b),
        },
    }
}

fn leading_number(label: &str) -> Option<f64> {
    let trimmed = label.trim_start_matches(['(', '[']);
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == 'e'))
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_categories_cover_all_rows() {
        let values: Vec<Option<f64>> = (1..=100).map(|i| Some(i as f64)).collect();
        let categories = quantile_categories(&values, 4);
        assert_eq!(categories.len(), 100);
        let distinct: HashSet<&String> = categories.iter().collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_missing_values_get_sentinel_label() {
        let values = vec![Some(1.0), None, Some(2.0), Some(3.0), None];
        let categories = quantile_categories(&values, 2);
        assert_eq!(categories[1], MISSING_LABEL);
        assert_eq!(categories[4], MISSING_LABEL);
        assert_ne!(categories[0], MISSING_LABEL);
    }

    #[test]
    fn test_quantile_fallback_on_constant_values() {
        let values = vec![Some(7.0); 10];
        let categories = quantile_categories(&values, 5);
        assert!(categories.iter().all(|c| c == "7"));
    }

    #[test]
    fn test_consolidate_totals_and_iv_roundtrip() {
        let categories: Vec<String> = (0..100)
            .map(|i| if i < 50 { "low" } else { "high" }.to_string())
            .collect();
        // "low" is mostly good, "high" mostly bad
        let target: Vec<Option<i32>> = (0..100)
            .map(|i| Some(if i < 50 { i32::from(i % 10 == 0) } else { i32::from(i % 3 != 0) }))
            .collect();

        let table = consolidate(&categories, &target);
        assert_eq!(table.n_total, 100);
        assert_eq!(table.n_bons + table.n_maus, 100);

        let sum_counts: u32 = table.rows.iter().map(|r| r.n_total).sum();
        assert_eq!(sum_counts, table.n_total);

        let sum_iv: f64 = table.rows.iter().map(|r| r.iv).sum();
        assert!((sum_iv - table.iv_total).abs() < 1e-12);
        assert!(table.iv_total > 0.0);
    }

    #[test]
    fn test_consolidate_woe_zero_when_one_sided() {
        let categories = vec!["a".to_string(), "a".to_string(), "b".to_string(), "b".to_string()];
        let target = vec![Some(1), Some(1), Some(0), Some(0)];

        let table = consolidate(&categories, &target);
        for row in &table.rows {
            assert_eq!(row.woe, 0.0, "one-sided category '{}' must have WOE 0", row.label);
            assert_eq!(row.iv, 0.0);
        }
    }

    #[test]
    fn test_consolidate_skips_null_targets() {
        let categories = vec!["a".to_string(), "a".to_string(), "a".to_string()];
        let target = vec![Some(1), None, Some(0)];
        let table = consolidate(&categories, &target);
        assert_eq!(table.n_total, 2);
    }

    #[test]
    fn test_missing_category_sorts_last() {
        let categories = vec![
            MISSING_LABEL.to_string(),
            "(1.000, 2.000]".to_string(),
            "(10.000, 20.000]".to_string(),
            "(2.000, 10.000]".to_string(),
        ];
        let target = vec![Some(0), Some(1), Some(0), Some(1)];
        let table = consolidate(&categories, &target);
        let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "(1.000, 2.000]",
                "(2.000, 10.000]",
                "(10.000, 20.000]",
                MISSING_LABEL
            ]
        );
    }

    #[test]
    fn test_regroup_identity_and_mapping() {
        let categories = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut mapping = HashMap::new();
        mapping.insert("a".to_string(), "ab".to_string());
        mapping.insert("b".to_string(), "ab".to_string());

        let grouped = regroup(&categories, &mapping);
        assert_eq!(grouped, vec!["ab", "ab", "c"]);

        let identity = regroup(&categories, &HashMap::new());
        assert_eq!(identity, categories);
    }

    #[test]
    fn test_ks_perfect_separation() {
        let scores = vec![0.1, 0.2, 0.3, 0.8, 0.9, 0.95];
        let target = vec![0, 0, 0, 1, 1, 1];
        let result = ks_statistic(&scores, &target).unwrap();
        assert!((result.ks - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ks_reports_score_at_max_gap() {
        let scores = vec![0.1, 0.2, 0.4, 0.6, 0.8, 0.9];
        let target = vec![0, 0, 0, 1, 0, 1];
        let result = ks_statistic(&scores, &target).unwrap();
        assert!(result.ks > 0.0 && result.ks <= 1.0);
        assert!(scores.contains(&result.score));
    }

    #[test]
    fn test_ks_degenerate_is_none() {
        assert!(ks_statistic(&[0.1, 0.2], &[1, 1]).is_none());
        assert!(ks_statistic(&[0.1, 0.2], &[0, 0]).is_none());
    }

    #[test]
    fn test_validate_binary_target() {
        let ok = df! {
            "alvo" => [0i32, 1, 0, 1],
        }
        .unwrap();
        assert!(validate_binary_target(&ok, "alvo").is_ok());

        let bad = df! {
            "alvo" => [0i32, 1, 2, 3],
        }
        .unwrap();
        let err = validate_binary_target(&bad, "alvo").unwrap_err();
        assert!(err.to_string().contains("distinct values"));

        let with_nulls = df! {
            "alvo" => [Some(0i32), Some(1), None, Some(0)],
        }
        .unwrap();
        assert!(validate_binary_target(&with_nulls, "alvo").is_ok());
    }

    #[test]
    fn test_default_rate_by_safra() {
        let safras = vec![
            "2024-03".to_string(),
            "2024-03".to_string(),
            "2024-04".to_string(),
            "2024-04".to_string(),
        ];
        let categories = vec![
            "a".to_string(),
            "a".to_string(),
            "a".to_string(),
            "b".to_string(),
        ];
        let target = vec![Some(1), Some(0), Some(0), Some(1)];

        let df = default_rate_by_safra(&safras, &categories, &target).unwrap();
        assert_eq!(df.height(), 3);
        let rates = df.column("tx_default").unwrap().f64().unwrap();
        assert_eq!(rates.get(0), Some(0.5));
        assert_eq!(rates.get(1), Some(0.0));
        assert_eq!(rates.get(2), Some(1.0));
    }

    #[test]
    fn test_variable_iv_on_separating_variable() {
        // Strong but imperfect separation: every bucket keeps a few
        // observations of the other class, so no WOE is zero-guarded
        let values: Vec<Option<f64>> = (0..200).map(|i| Some(i as f64)).collect();
        let target: Vec<Option<i32>> = (0..200)
            .map(|i| {
                Some(i32::from(
                    (i >= 120 && i % 23 != 0) || (i < 120 && i % 19 == 0),
                ))
            })
            .collect();
        let iv = variable_iv(&values, &target, 5).unwrap();
        assert!(iv > 0.5, "a strongly separating variable should have high IV, got {}", iv);
    }
}

//! Preprocessing of the three raw tables into typed rows
//!
//! Field-level failures (unparsable dates or numbers) degrade to missing
//! values and never drop a row. The one fatal case is a delinquency safra
//! label that does not match `YYYY-MM`: the reference date derives from
//! it, so the whole preprocessing call fails.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use super::calendar::{last_day_of_month, month_label};

/// Canonical column names shared across the pipeline.
pub const ID_COL: &str = "id_cliente";
pub const SAFRA_COL: &str = "mes_safra";
pub const REF_COL: &str = "data_referencia";
pub const TARGET_COL: &str = "atraso_90d";
pub const TX_DATE_COL: &str = "data_transacao";
pub const TX_VALUE_COL: &str = "valor_transacao";

/// Day/month/year format used by the raw customer and transaction tables.
const RAW_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("invalid safra label '{value}' at row {row}: expected YYYY-MM")]
    InvalidSafra { value: String, row: usize },
    #[error("missing safra label at row {row}: expected YYYY-MM")]
    MissingSafra { row: usize },
}

/// A preprocessed customer, one per `id_cliente`.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub id_cliente: String,
    pub idade: Option<f64>,
    pub renda_mensal: Option<f64>,
    pub data_abertura_conta: Option<NaiveDate>,
    pub mes_abertura_conta: Option<String>,
    pub estado_civil: Option<String>,
    pub tempo_emprego_anos: Option<f64>,
    pub qtde_produtos: Option<f64>,
    pub score_interno: Option<f64>,
    pub limite_credito: Option<f64>,
}

/// One delinquency observation: the ABT grain.
#[derive(Debug, Clone)]
pub struct DelinquencyRow {
    pub id_cliente: String,
    pub mes_safra: String,
    pub data_referencia: NaiveDate,
    pub atraso_90d: Option<i32>,
}

/// One transaction event.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id_cliente: String,
    pub data_transacao: Option<NaiveDate>,
    pub mes_safra: Option<String>,
    pub valor_transacao: Option<f64>,
}

/// Preprocess the customer table: coerce identifier and numerics, parse
/// the account-opening date, derive the opening-month label, normalize
/// marital status.
pub fn preprocess_customers(df: &DataFrame) -> Result<Vec<CustomerRecord>> {
    let ids = string_values(df.column(ID_COL).context("customer table")?)?;
    let idades = numeric_values(df.column("idade").context("customer table")?)?;
    let rendas = numeric_values(df.column("renda_mensal").context("customer table")?)?;
    let aberturas = date_values(df.column("data_abertura_conta").context("customer table")?)?;
    let estados = string_values(df.column("estado_civil").context("customer table")?)?;
    let tempos = numeric_values(df.column("tempo_emprego_anos").context("customer table")?)?;
    let produtos = numeric_values(df.column("qtde_produtos").context("customer table")?)?;
    let scores = numeric_values(df.column("score_interno").context("customer table")?)?;
    let limites = numeric_values(df.column("limite_credito").context("customer table")?)?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let abertura = aberturas[i];
        records.push(CustomerRecord {
            id_cliente: ids[i].clone().unwrap_or_default(),
            idade: idades[i],
            renda_mensal: rendas[i],
            data_abertura_conta: abertura,
            mes_abertura_conta: abertura.map(month_label),
            estado_civil: estados[i]
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            tempo_emprego_anos: tempos[i],
            qtde_produtos: produtos[i],
            score_interno: scores[i],
            limite_credito: limites[i],
        });
    }
    Ok(records)
}

/// Preprocess the delinquency table: parse safra labels (fatal on
/// mismatch), derive the reference date as the safra month's last day,
/// and binarize the outcome.
pub fn preprocess_delinquency(df: &DataFrame) -> Result<Vec<DelinquencyRow>> {
    let ids = string_values(df.column(ID_COL).context("delinquency table")?)?;
    let safras = string_values(df.column(SAFRA_COL).context("delinquency table")?)?;
    let outcomes = numeric_values(df.column(TARGET_COL).context("delinquency table")?)?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw = safras[i]
            .as_deref()
            .ok_or(PreprocessError::MissingSafra { row: i })?;
        let (year, month) = parse_safra(raw).ok_or_else(|| PreprocessError::InvalidSafra {
            value: raw.to_string(),
            row: i,
        })?;
        let data_referencia = last_day_of_month(year, month);
        rows.push(DelinquencyRow {
            id_cliente: ids[i].clone().unwrap_or_default(),
            mes_safra: month_label(data_referencia),
            data_referencia,
            atraso_90d: binarize_outcome(outcomes[i]),
        });
    }
    Ok(rows)
}

/// Preprocess the transaction table: coerce identifier and value, parse
/// the transaction date (unparsable becomes missing), derive the month
/// label, and sort by (customer, date) with undated rows last.
pub fn preprocess_transactions(df: &DataFrame) -> Result<Vec<Transaction>> {
    let ids = string_values(df.column(ID_COL).context("transaction table")?)?;
    let dates = date_values(df.column(TX_DATE_COL).context("transaction table")?)?;
    let values = numeric_values(df.column(TX_VALUE_COL).context("transaction table")?)?;

    let mut txs = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        txs.push(Transaction {
            id_cliente: ids[i].clone().unwrap_or_default(),
            data_transacao: dates[i],
            mes_safra: dates[i].map(month_label),
            valor_transacao: values[i],
        });
    }
    txs.sort_by(|a, b| {
        a.id_cliente
            .cmp(&b.id_cliente)
            .then(match (a.data_transacao, b.data_transacao) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    Ok(txs)
}

/// Normalize a raw outcome code: non-null values >= 1 collapse to 1
/// (any positive delinquency code counts as default), everything else
/// non-null is 0, null stays null. Applying it twice is a no-op.
pub fn binarize_outcome(raw: Option<f64>) -> Option<i32> {
    raw.map(|v| if v >= 1.0 { 1 } else { 0 })
}

/// Parse a `YYYY-MM` safra label.
fn parse_safra(raw: &str) -> Option<(i32, u32)> {
    let (y, m) = raw.trim().split_once('-')?;
    if y.len() != 4 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

/// Coerce a column to canonical string form (identifiers, labels).
pub fn string_values(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };
    Ok(values)
}

/// Coerce a column to numeric; unparsable strings become missing.
pub fn numeric_values(col: &Column) -> Result<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = if col.dtype().is_primitive_numeric() {
        let cast = col.cast(&DataType::Float64)?;
        cast.f64()?.into_iter().collect()
    } else if matches!(col.dtype(), DataType::Boolean) {
        col.bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
            .collect()
    } else {
        let cast = col.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect()
    };
    Ok(values)
}

/// Parse a day/month/year date column; unparsable values become missing.
pub fn date_values(col: &Column) -> Result<Vec<Option<NaiveDate>>> {
    let strings = string_values(col)?;
    Ok(strings
        .into_iter()
        .map(|v| v.and_then(|s| NaiveDate::parse_from_str(s.trim(), RAW_DATE_FORMAT).ok()))
        .collect())
}

//! ABT assembly: the delinquency table is the grain, every feature table
//! left-joins onto it.

use anyhow::{Context, Result};
use polars::prelude::*;

use super::features::customer::{cadastral_features, relationship_features};
use super::features::flags::flag_features;
use super::features::quantity::quantity_features;
use super::features::time::time_features;
use super::features::value::value_features;
use super::history::HistoryIndex;
use super::preprocess::{CustomerRecord, DelinquencyRow, ID_COL, REF_COL, SAFRA_COL, TARGET_COL};

/// ABT build configuration.
#[derive(Debug, Clone, Copy)]
pub struct AbtConfig {
    /// When true (the default policy), the feature cutoff is the last day
    /// of the month before the reference date, keeping the observation
    /// month out of the features.
    pub use_prior_month: bool,
}

impl Default for AbtConfig {
    fn default() -> Self {
        Self {
            use_prior_month: true,
        }
    }
}

/// The base table: one row per delinquency observation.
pub fn delinquency_frame(rows: &[DelinquencyRow]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            ID_COL.into(),
            rows.iter().map(|r| r.id_cliente.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            SAFRA_COL.into(),
            rows.iter().map(|r| r.mes_safra.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            REF_COL.into(),
            rows.iter()
                .map(|r| r.data_referencia.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            TARGET_COL.into(),
            rows.iter().map(|r| r.atraso_90d).collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Build the full ABT: static cadastral features joined by customer,
/// then every windowed family joined by (customer, reference date).
/// Left joins keep exactly one output row per delinquency row; customers
/// without cadastral or transactional history get nulls, never dropped.
pub fn build_abt(
    customers: &[CustomerRecord],
    delinquency: &[DelinquencyRow],
    index: &HistoryIndex,
    config: &AbtConfig,
) -> Result<DataFrame> {
    let mut abt = delinquency_frame(delinquency)?;

    let cadastral = cadastral_features(customers).context("cadastral features")?;
    abt = abt
        .left_join(&cadastral, [ID_COL], [ID_COL])
        .context("joining cadastral features")?;

    let keyed = [
        value_features(delinquency, index, config.use_prior_month).context("value features")?,
        quantity_features(delinquency, index, config.use_prior_month)
            .context("quantity features")?,
        time_features(delinquency, index, config.use_prior_month).context("time features")?,
        flag_features(delinquency, index, config.use_prior_month).context("flag features")?,
        relationship_features(customers, delinquency, config.use_prior_month)
            .context("relationship features")?,
    ];
    for features in keyed {
        abt = abt
            .left_join(&features, [ID_COL, REF_COL], [ID_COL, REF_COL])
            .context("joining windowed features")?;
    }

    anyhow::ensure!(
        abt.height() == delinquency.len(),
        "ABT row count {} diverged from the delinquency grain {}",
        abt.height(),
        delinquency.len()
    );
    Ok(abt)
}

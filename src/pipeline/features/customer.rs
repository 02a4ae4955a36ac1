//! Cadastral features: static per-customer attributes and derived
//! relationship features that depend on the reference date.

use std::collections::HashMap;

use anyhow::Result;
use polars::prelude::*;

use super::super::calendar::cutoff_date;
use super::super::preprocess::{CustomerRecord, DelinquencyRow, ID_COL};
use super::compare::round_to;
use super::key_columns;

const DAYS_PER_YEAR: f64 = 365.25;
const DAYS_PER_MONTH: f64 = 30.44;

/// Years of relationship above which a customer counts as "antigo".
const OLD_CUSTOMER_YEARS: f64 = 5.0;

/// Static cadastral features, one row per customer, keyed by
/// `id_cliente`: the preprocessed attributes plus `idade2`, `log_renda`
/// and `renda_por_limite`.
pub fn cadastral_features(customers: &[CustomerRecord]) -> Result<DataFrame> {
    let ids: Vec<String> = customers.iter().map(|c| c.id_cliente.clone()).collect();
    let aberturas: Vec<Option<String>> = customers
        .iter()
        .map(|c| c.data_abertura_conta.map(|d| d.to_string()))
        .collect();

    let columns = vec![
        Column::new(ID_COL.into(), ids),
        Column::new(
            "idade".into(),
            customers.iter().map(|c| c.idade).collect::<Vec<_>>(),
        ),
        Column::new(
            "renda_mensal".into(),
            customers.iter().map(|c| c.renda_mensal).collect::<Vec<_>>(),
        ),
        Column::new("data_abertura_conta".into(), aberturas),
        Column::new(
            "mes_abertura_conta".into(),
            customers
                .iter()
                .map(|c| c.mes_abertura_conta.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "estado_civil".into(),
            customers
                .iter()
                .map(|c| c.estado_civil.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "tempo_emprego_anos".into(),
            customers
                .iter()
                .map(|c| c.tempo_emprego_anos)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "qtde_produtos".into(),
            customers.iter().map(|c| c.qtde_produtos).collect::<Vec<_>>(),
        ),
        Column::new(
            "score_interno".into(),
            customers.iter().map(|c| c.score_interno).collect::<Vec<_>>(),
        ),
        Column::new(
            "limite_credito".into(),
            customers
                .iter()
                .map(|c| c.limite_credito)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "idade2".into(),
            customers
                .iter()
                .map(|c| c.idade.map(|v| v * v))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "log_renda".into(),
            customers
                .iter()
                .map(|c| c.renda_mensal.map(|v| (1.0 + v).ln()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "renda_por_limite".into(),
            customers
                .iter()
                .map(|c| match (c.renda_mensal, c.limite_credito) {
                    (Some(renda), Some(limite)) if limite > 0.0 => Some(renda / limite),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
    ];

    Ok(DataFrame::new(columns)?)
}

#[derive(Debug, Clone, Copy, Default)]
struct RelationshipRow {
    anos: Option<f64>,
    meses: Option<f64>,
    tempo_isna: i32,
    flag_antigo: Option<i32>,
    flag_antigo_isna: i32,
    idade_relativa: Option<f64>,
    limite_por_ano: Option<f64>,
    limite_por_ano_isna: i32,
    limite_por_mes: Option<f64>,
    limite_por_mes_isna: i32,
    produtos_por_ano: Option<f64>,
    produtos_por_ano_isna: i32,
    produtos_por_mes: Option<f64>,
    produtos_por_mes_isna: i32,
}

impl RelationshipRow {
    fn missing() -> Self {
        Self {
            tempo_isna: 1,
            flag_antigo_isna: 1,
            limite_por_ano_isna: 1,
            limite_por_mes_isna: 1,
            produtos_por_ano_isna: 1,
            produtos_por_mes_isna: 1,
            ..Default::default()
        }
    }
}

/// Reference-dependent relationship features, one row per delinquency
/// row, keyed by (`id_cliente`, `data_referencia`). Each derived value
/// carries an `_isna` companion set to 1 when it could not be computed.
pub fn relationship_features(
    customers: &[CustomerRecord],
    rows: &[DelinquencyRow],
    use_prior_month: bool,
) -> Result<DataFrame> {
    let by_id: HashMap<&str, &CustomerRecord> = customers
        .iter()
        .map(|c| (c.id_cliente.as_str(), c))
        .collect();

    let computed: Vec<RelationshipRow> = rows
        .iter()
        .map(|row| match by_id.get(row.id_cliente.as_str()) {
            Some(customer) => compute_row(customer, row, use_prior_month),
            None => RelationshipRow::missing(),
        })
        .collect();

    let mut columns = key_columns(rows);
    columns.push(Column::new(
        "tempo_relacionamento_anos".into(),
        computed.iter().map(|r| r.anos).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "tempo_relacionamento_meses".into(),
        computed.iter().map(|r| r.meses).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "tempo_relacionamento_isna".into(),
        computed.iter().map(|r| r.tempo_isna).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "flag_cliente_antigo".into(),
        computed.iter().map(|r| r.flag_antigo).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "flag_cliente_antigo_isna".into(),
        computed.iter().map(|r| r.flag_antigo_isna).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "idade_relativa".into(),
        computed.iter().map(|r| r.idade_relativa).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "limite_por_ano_conta".into(),
        computed.iter().map(|r| r.limite_por_ano).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "limite_por_ano_conta_isna".into(),
        computed.iter().map(|r| r.limite_por_ano_isna).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "limite_por_mes_conta".into(),
        computed.iter().map(|r| r.limite_por_mes).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "limite_por_mes_conta_isna".into(),
        computed.iter().map(|r| r.limite_por_mes_isna).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "produtos_por_ano_conta".into(),
        computed.iter().map(|r| r.produtos_por_ano).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "produtos_por_ano_conta_isna".into(),
        computed.iter().map(|r| r.produtos_por_ano_isna).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "produtos_por_mes_conta".into(),
        computed.iter().map(|r| r.produtos_por_mes).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "produtos_por_mes_conta_isna".into(),
        computed.iter().map(|r| r.produtos_por_mes_isna).collect::<Vec<_>>(),
    ));

    Ok(DataFrame::new(columns)?)
}

fn compute_row(
    customer: &CustomerRecord,
    row: &DelinquencyRow,
    use_prior_month: bool,
) -> RelationshipRow {
    let cutoff = cutoff_date(row.data_referencia, use_prior_month);
    let mut feats = RelationshipRow::missing();

    if let Some(abertura) = customer.data_abertura_conta {
        let days = (cutoff - abertura).num_days();
        if days > 0 {
            feats.anos = Some(round_to(days as f64 / DAYS_PER_YEAR, 4));
            feats.meses = Some(round_to(days as f64 / DAYS_PER_MONTH, 4));
            feats.tempo_isna = 0;
        }
    }

    if let Some(anos) = feats.anos {
        feats.flag_antigo = Some(if anos > OLD_CUSTOMER_YEARS { 1 } else { 0 });
        feats.flag_antigo_isna = 0;

        if let Some(idade) = customer.idade {
            feats.idade_relativa = Some(round_to(idade - anos, 4));
        }

        if anos > 0.0 {
            if let Some(limite) = customer.limite_credito {
                feats.limite_por_ano = Some(limite / anos);
                feats.limite_por_ano_isna = 0;
            }
            if let Some(produtos) = customer.qtde_produtos {
                feats.produtos_por_ano = Some(produtos / anos);
                feats.produtos_por_ano_isna = 0;
            }
        }
    }

    if let Some(meses) = feats.meses {
        if meses > 0.0 {
            if let Some(limite) = customer.limite_credito {
                feats.limite_por_mes = Some(limite / meses);
                feats.limite_por_mes_isna = 0;
            }
            if let Some(produtos) = customer.qtde_produtos {
                feats.produtos_por_mes = Some(produtos / meses);
                feats.produtos_por_mes_isna = 0;
            }
        }
    }

    feats
}

//! Shared test utilities and fixture generators

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Raw customer table the way the `;`-separated extract arrives:
/// identifiers may be numeric, dates are day/month/year strings, and
/// some fields are malformed on purpose.
pub fn raw_customers() -> DataFrame {
    df! {
        "id_cliente" => ["C1", "C2", "C3"],
        "idade" => ["34", "52", "abc"],
        "renda_mensal" => [Some("2500.0"), None, Some("1800.0")],
        "data_abertura_conta" => ["15/06/2019", "01/01/2015", "not-a-date"],
        "estado_civil" => [Some(" Casado "), Some("SOLTEIRO"), None],
        "tempo_emprego_anos" => ["4", "10", "2"],
        "qtde_produtos" => ["2", "3", "1"],
        "score_interno" => ["610", "720", "480"],
        "limite_credito" => ["5000", "12000", "0"],
    }
    .unwrap()
}

/// Raw delinquency table: safra labels plus near-binary outcome codes
/// (the raw `5` must binarize to 1, nulls must survive).
pub fn raw_delinquency() -> DataFrame {
    df! {
        "id_cliente" => ["C1", "C1", "C2", "C4", "C3"],
        "mes_safra" => ["2024-03", "2024-04", "2024-04", "2024-04", "2024-04"],
        "atraso_90d" => [Some(0i64), Some(5), Some(0), Some(1), None],
    }
    .unwrap()
}

/// Raw transaction table. C1 carries the worked example
/// (2024-03-04, 2024-03-23, 2024-04-22); C3 only has an unparsable
/// date, so it is in the log without usable history; C4 never appears.
pub fn raw_transactions() -> DataFrame {
    df! {
        "id_cliente" => ["C1", "C1", "C1", "C2", "C2", "C3"],
        "data_transacao" => [
            "04/03/2024",
            "23/03/2024",
            "22/04/2024",
            "10/01/2023",
            "05/02/2024",
            "99/99/9999",
        ],
        "valor_transacao" => ["150.0", "50.0", "200.0", "75.5", "30.0", "10.0"],
    }
    .unwrap()
}

/// Write the three raw tables as `;`-separated CSVs into a temp dir.
pub fn write_raw_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();
    for (name, mut df) in [
        ("clientes.csv", raw_customers()),
        ("inadimplencia.csv", raw_delinquency()),
        ("transacoes.csv", raw_transactions()),
    ] {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        CsvWriter::new(&mut file)
            .with_separator(b';')
            .finish(&mut df)
            .unwrap();
    }
    (temp_dir, dir)
}

/// Locate the row of an (id_cliente, data_referencia) pair without
/// relying on join output order.
pub fn abt_row(df: &DataFrame, id: &str, reference: &str) -> usize {
    let ids = df.column("id_cliente").unwrap().str().unwrap();
    let refs = df.column("data_referencia").unwrap().str().unwrap();
    for i in 0..df.height() {
        if ids.get(i) == Some(id) && refs.get(i) == Some(reference) {
            return i;
        }
    }
    panic!("row ({}, {}) not found in ABT", id, reference);
}

/// Fetch a float cell by column name and row index.
pub fn get_f64(df: &DataFrame, name: &str, row: usize) -> Option<f64> {
    df.column(name)
        .unwrap_or_else(|_| panic!("missing column {}", name))
        .f64()
        .unwrap_or_else(|_| panic!("column {} is not f64", name))
        .get(row)
}

/// Fetch an integer cell by column name and row index.
pub fn get_i32(df: &DataFrame, name: &str, row: usize) -> Option<i32> {
    df.column(name)
        .unwrap_or_else(|_| panic!("missing column {}", name))
        .i32()
        .unwrap_or_else(|_| panic!("column {} is not i32", name))
        .get(row)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

//! Delimited-file loading for the three raw tables and built ABTs

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Raw file names expected inside the input directory.
pub const CUSTOMERS_FILE: &str = "clientes.csv";
pub const DELINQUENCY_FILE: &str = "inadimplencia.csv";
pub const TRANSACTIONS_FILE: &str = "transacoes.csv";

/// Map keys of the raw-table mapping.
pub const CUSTOMERS_TABLE: &str = "clientes";
pub const DELINQUENCY_TABLE: &str = "inadimplencia";
pub const TRANSACTIONS_TABLE: &str = "transacoes";

/// Load a single delimited file into a DataFrame.
pub fn load_table(path: &Path, separator: u8) -> Result<DataFrame> {
    let lf = LazyCsvReader::new(path)
        .with_separator(separator)
        .with_infer_schema_length(Some(10_000))
        .finish()
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    lf.collect()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))
}

/// Load the three raw tables from a directory into a name -> table map.
/// The raw extracts use `;` as separator.
pub fn load_raw_tables(dir: &Path) -> Result<HashMap<String, DataFrame>> {
    let mut tables = HashMap::new();
    for (key, file) in [
        (CUSTOMERS_TABLE, CUSTOMERS_FILE),
        (DELINQUENCY_TABLE, DELINQUENCY_FILE),
        (TRANSACTIONS_TABLE, TRANSACTIONS_FILE),
    ] {
        let path = dir.join(file);
        let df = load_table(&path, b';')
            .with_context(|| format!("Failed to load raw table '{}'", key))?;
        tables.insert(key.to_string(), df);
    }
    Ok(tables)
}

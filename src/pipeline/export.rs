//! Delimited-text export of final tables

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Write a table as delimited text.
pub fn export_table(df: &mut DataFrame, path: &Path, separator: u8) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .with_separator(separator)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

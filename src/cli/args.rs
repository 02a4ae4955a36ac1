//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Safra - Build credit-risk analytical base tables and categorize variables
#[derive(Parser, Debug)]
#[command(name = "safra")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the ABT from the raw customer, delinquency and transaction tables
    Build {
        /// Directory containing clientes.csv, inadimplencia.csv and transacoes.csv
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output file path for the ABT (delimited text).
        /// Defaults to abt.csv inside the input directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the reference month itself in the feature windows
        /// (M policy). By default the cutoff is the last day of the
        /// month before the reference date (M-1), which keeps the
        /// observation month out of the features.
        #[arg(long, default_value = "false")]
        include_reference_month: bool,

        /// Field separator of the raw and output files
        #[arg(long, default_value = ";", value_parser = validate_separator)]
        separator: char,
    },

    /// Interactive binning and manual regrouping over a built ABT
    Categorize {
        /// ABT file (delimited text)
        #[arg(short, long)]
        input: PathBuf,

        /// Binary target column (non-binary columns are rejected)
        #[arg(short, long, default_value = "atraso_90d")]
        target: String,

        /// Safra column used for the default-rate-by-safra view
        #[arg(long, default_value = "mes_safra")]
        safra_column: String,

        /// Number of initial quantile buckets per variable
        #[arg(short = 'q', long, default_value = "5", value_parser = validate_buckets)]
        buckets: usize,

        /// Output path for the exported categorized table.
        /// Defaults to the input with a '_categorizada' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file the categorization session is loaded from and saved to
        #[arg(long)]
        session: Option<PathBuf>,

        /// Field separator of the input and output files
        #[arg(long, default_value = ";", value_parser = validate_separator)]
        separator: char,
    },

    /// Column diagnostics and IV ranking for a built ABT
    Diagnose {
        /// ABT file (delimited text)
        #[arg(short, long)]
        input: PathBuf,

        /// Binary target column for the IV ranking
        #[arg(short, long, default_value = "atraso_90d")]
        target: String,

        /// Number of quantile buckets for the IV ranking
        #[arg(long, default_value = "10", value_parser = validate_buckets)]
        buckets: usize,

        /// Extra columns to exclude from profiling and ranking
        /// (comma-separated; key columns are always excluded)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// How many variables to show in the IV ranking
        #[arg(long, default_value = "20")]
        top: usize,

        /// Field separator of the input file
        #[arg(long, default_value = ";", value_parser = validate_separator)]
        separator: char,
    },
}

/// Validator for bucket counts
fn validate_buckets(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bucket count", s))?;
    if value < 2 {
        Err(format!("bucket count must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for single-byte field separators
fn validate_separator(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!(
            "separator must be a single ASCII character, got '{}'",
            s
        )),
    }
}

/// Derive the default output path for a built ABT.
pub fn default_abt_path(input_dir: &PathBuf) -> PathBuf {
    input_dir.join("abt.csv")
}

/// Derive the default output path for an exported categorized table.
pub fn default_categorized_path(input: &PathBuf) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input.extension().and_then(|e| e.to_str()).unwrap_or("csv");
    parent.join(format!("{}_categorizada.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_buckets() {
        assert_eq!(validate_buckets("5"), Ok(5));
        assert!(validate_buckets("1").is_err());
        assert!(validate_buckets("abc").is_err());
    }

    #[test]
    fn test_validate_separator() {
        assert_eq!(validate_separator(";"), Ok(';'));
        assert_eq!(validate_separator(","), Ok(','));
        assert!(validate_separator(";;").is_err());
        assert!(validate_separator("").is_err());
    }

    #[test]
    fn test_default_categorized_path() {
        let input = PathBuf::from("/tmp/abt.csv");
        assert_eq!(
            default_categorized_path(&input),
            PathBuf::from("/tmp/abt_categorizada.csv")
        );
    }
}

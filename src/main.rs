//! Safra: Credit-Risk ABT CLI Tool
//!
//! Builds the analytical base table from the raw customer, delinquency
//! and transaction extracts, runs interactive categorization sessions
//! over it, and reports column diagnostics and IV rankings.

mod cli;
mod pipeline;
mod report;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{
    default_abt_path, default_categorized_path, run_session, CategorizationStore,
    CategorizeOptions, Cli, Commands,
};
use pipeline::{
    build_abt, diagnose_abt, export_table, iv_ranking, load_raw_tables, load_table,
    numeric_values, preprocess_customers, preprocess_delinquency, preprocess_transactions,
    variable_ks, AbtConfig, DiagnosticsConfig, HistoryIndex, CUSTOMERS_TABLE, DELINQUENCY_TABLE,
    TRANSACTIONS_TABLE,
};
use report::{render_frame, BuildSummary};
use utils::{
    create_spinner, finish_with_success, print_banner, print_build_config, print_completion,
    print_count, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input_dir,
            output,
            include_reference_month,
            separator,
        } => run_build(input_dir, output, !include_reference_month, separator),
        Commands::Categorize {
            input,
            target,
            safra_column,
            buckets,
            output,
            session,
            separator,
        } => run_categorize(input, target, safra_column, buckets, output, session, separator),
        Commands::Diagnose {
            input,
            target,
            buckets,
            exclude,
            top,
            separator,
        } => run_diagnose(input, target, buckets, exclude, top, separator),
    }
}

fn run_build(
    input_dir: PathBuf,
    output: Option<PathBuf>,
    use_m1: bool,
    separator: char,
) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    let output = output.unwrap_or_else(|| default_abt_path(&input_dir));
    print_build_config(&input_dir, &output, use_m1, separator);

    let mut summary = BuildSummary::new();

    // Step 1: Load the three raw tables
    print_step_header(1, "Load Raw Tables");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading raw tables...");
    let tables = load_raw_tables(&input_dir)?;
    finish_with_success(&spinner, "Raw tables loaded");
    summary.set_load_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    // Step 2: Preprocess into typed rows
    print_step_header(2, "Preprocess");
    let step_start = Instant::now();
    let customers = preprocess_customers(
        tables
            .get(CUSTOMERS_TABLE)
            .context("customer table missing from raw map")?,
    )?;
    let delinquency = preprocess_delinquency(
        tables
            .get(DELINQUENCY_TABLE)
            .context("delinquency table missing from raw map")?,
    )?;
    let transactions = preprocess_transactions(
        tables
            .get(TRANSACTIONS_TABLE)
            .context("transaction table missing from raw map")?,
    )?;
    print_count("customers", customers.len());
    print_count("delinquency observations", delinquency.len());
    print_count("transactions", transactions.len());
    summary.customers = customers.len();
    summary.delinquency_rows = delinquency.len();
    summary.transactions = transactions.len();
    summary.set_preprocess_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    // Step 3: Window features and ABT assembly
    print_step_header(3, "Window Features");
    let step_start = Instant::now();
    let index = HistoryIndex::build(&transactions);
    summary.customers_with_history = index.len();
    let config = AbtConfig {
        use_prior_month: use_m1,
    };
    let mut abt = build_abt(&customers, &delinquency, &index, &config)?;
    print_success("ABT assembled");
    summary.abt_rows = abt.height();
    summary.abt_columns = abt.width();
    summary.set_features_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    // Step 4: Save
    print_step_header(4, "Save ABT");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");
    export_table(&mut abt, &output, separator as u8)?;
    finish_with_success(&spinner, &format!("Saved to {}", output.display()));
    summary.set_save_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    summary.display();
    print_completion("ABT build complete!");
    Ok(())
}

fn run_categorize(
    input: PathBuf,
    target: String,
    safra_column: String,
    buckets: usize,
    output: Option<PathBuf>,
    session: Option<PathBuf>,
    separator: char,
) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let df = load_table(&input, separator as u8)?;
    print_success(&format!(
        "Loaded {} rows, {} columns from {}",
        df.height(),
        df.width(),
        input.display()
    ));

    let mut store = match &session {
        Some(path) => CategorizationStore::load(path)?,
        None => CategorizationStore::new(),
    };
    if !store.is_empty() {
        print_success(&format!(
            "Resumed session with {} saved variable(s)",
            store.len()
        ));
    }

    let options = CategorizeOptions {
        target,
        safra_column,
        buckets,
        output: output.unwrap_or_else(|| default_categorized_path(&input)),
        session,
        separator: separator as u8,
    };
    run_session(&df, &options, &mut store)
}

fn run_diagnose(
    input: PathBuf,
    target: String,
    buckets: usize,
    exclude: Vec<String>,
    top: usize,
    separator: char,
) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let df = load_table(&input, separator as u8)?;
    print_success(&format!(
        "Loaded {} rows, {} columns from {}",
        df.height(),
        df.width(),
        input.display()
    ));

    let mut config = DiagnosticsConfig {
        buckets,
        ..Default::default()
    };
    config.exclude.extend(exclude);
    config.exclude.push(target.clone());

    print_step_header(1, "Column Profile");
    let profile = diagnose_abt(&df, &config)?;
    println!("{}", render_frame(&profile));

    print_step_header(2, "IV Ranking");
    let ranking = iv_ranking(&df, &target, &config)?;
    if ranking.is_empty() {
        println!("      No rankable numeric variables found");
    } else {
        let target_values: Vec<Option<i32>> = numeric_values(df.column(&target)?)?
            .into_iter()
            .map(|v| v.map(|x| if x >= 1.0 { 1 } else { 0 }))
            .collect();
        println!("      {:<42} {:>8} {:>8}", "variavel", "IV", "KS");
        for (variable, iv) in ranking.iter().take(top) {
            let values = numeric_values(df.column(variable)?)?;
            let ks = variable_ks(&values, &target_values)
                .map(|r| format!("{:.4}", r.ks))
                .unwrap_or_default();
            println!("      {:<42} {:>8.4} {:>8}", variable, iv, ks);
        }
    }

    print_completion("Diagnostics complete!");
    Ok(())
}

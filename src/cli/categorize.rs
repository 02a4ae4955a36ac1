//! Interactive categorization session
//!
//! Drives the binning + manual regrouping loop over a built ABT: pick a
//! variable, inspect the initial quantile categorization, type a group
//! label per category, inspect the regrouped table and the default rate
//! per safra, then save/reset/export through the injected store.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use polars::prelude::*;

use crate::pipeline::binning::{
    consolidate, default_rate_by_safra, quantile_categories, regroup, validate_binary_target,
};
use crate::pipeline::export::export_table;
use crate::pipeline::preprocess::{numeric_values, string_values};
use crate::report::{render_consolidated, render_frame};
use crate::utils::{print_info, print_success};

use super::store::CategorizationStore;

/// Options of one categorization session.
#[derive(Debug, Clone)]
pub struct CategorizeOptions {
    pub target: String,
    pub safra_column: String,
    pub buckets: usize,
    pub output: PathBuf,
    pub session: Option<PathBuf>,
    pub separator: u8,
}

/// Numeric columns eligible for categorization: everything except the
/// target and the safra column.
pub fn candidate_variables(df: &DataFrame, options: &CategorizeOptions) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| {
            col.dtype().is_primitive_numeric()
                && col.name().as_str() != options.target
                && col.name().as_str() != options.safra_column
        })
        .map(|col| col.name().to_string())
        .collect()
}

/// Append one `{var}_cat` column per saved variable, recomputing the
/// initial quantile categories and applying the saved regrouping.
pub fn apply_saved(
    df: &DataFrame,
    store: &CategorizationStore,
    buckets: usize,
) -> Result<DataFrame> {
    let mut out = df.clone();
    for variable in store.variables() {
        let saved = store.get(variable).expect("listed variable is present");
        let values = numeric_values(
            out.column(variable)
                .with_context(|| format!("Saved variable '{}' not in table", variable))?,
        )?;
        let categories = quantile_categories(&values, buckets);
        let grouped = regroup(&categories, &saved.mapping);
        out.with_column(Column::new(format!("{}_cat", variable).into(), grouped))?;
    }
    Ok(out)
}

/// Run the interactive loop until the user quits.
pub fn run_session(
    df: &DataFrame,
    options: &CategorizeOptions,
    store: &mut CategorizationStore,
) -> Result<()> {
    validate_binary_target(df, &options.target)?;

    let target_values: Vec<Option<i32>> = numeric_values(df.column(&options.target)?)?
        .into_iter()
        .map(|v| v.map(|x| if x >= 1.0 { 1 } else { 0 }))
        .collect();
    let safras: Vec<String> = string_values(
        df.column(&options.safra_column)
            .with_context(|| format!("Safra column '{}' not found", options.safra_column))?,
    )?
    .into_iter()
    .map(|v| v.unwrap_or_default())
    .collect();

    let variables = candidate_variables(df, options);
    if variables.is_empty() {
        anyhow::bail!("No numeric variables available for categorization");
    }

    loop {
        let actions = [
            "Categorize a variable",
            "List saved variables",
            "Reset one variable",
            "Reset all",
            "Export categorized table",
            "Quit",
        ];
        let choice = Select::new()
            .with_prompt("Action")
            .items(&actions)
            .default(0)
            .interact()?;

        match choice {
            0 => categorize_variable(df, options, store, &variables, &target_values, &safras)?,
            1 => list_saved(store),
            2 => reset_one(store, options)?,
            3 => {
                if Confirm::new()
                    .with_prompt("Reset every saved categorization?")
                    .default(false)
                    .interact()?
                {
                    store.reset_all();
                    persist(store, options)?;
                    print_success("All categorizations reset");
                }
            }
            4 => {
                let mut categorized = apply_saved(df, store, options.buckets)?;
                export_table(&mut categorized, &options.output, options.separator)?;
                print_success(&format!("Exported to {}", options.output.display()));
            }
            _ => break,
        }
    }
    Ok(())
}

fn categorize_variable(
    df: &DataFrame,
    options: &CategorizeOptions,
    store: &mut CategorizationStore,
    variables: &[String],
    target_values: &[Option<i32>],
    safras: &[String],
) -> Result<()> {
    let idx = Select::new()
        .with_prompt("Variable")
        .items(variables)
        .default(0)
        .interact()?;
    let variable = &variables[idx];

    let values = numeric_values(df.column(variable)?)?;
    let categories = quantile_categories(&values, options.buckets);
    let initial = consolidate(&categories, target_values);

    println!();
    println!(
        "  {} Initial categorization of {}",
        style("✧").cyan(),
        style(variable).bold()
    );
    println!("{}", render_consolidated(&initial));

    let mut mapping: HashMap<String, String> = HashMap::new();
    for row in &initial.rows {
        let group: String = Input::new()
            .with_prompt(format!("Group for {}", row.label))
            .default(row.label.clone())
            .interact_text()?;
        if group != row.label {
            mapping.insert(row.label.clone(), group);
        }
    }

    let grouped = regroup(&categories, &mapping);
    let current = consolidate(&grouped, target_values);

    println!();
    println!(
        "  {} Current categorization of {}",
        style("✧").cyan(),
        style(variable).bold()
    );
    println!("{}", render_consolidated(&current));

    let rates = default_rate_by_safra(safras, &grouped, target_values)?;
    println!("  {} Default rate per safra", style("✧").cyan());
    println!("{}", render_frame(&rates));

    if Confirm::new()
        .with_prompt(format!("Save categorization of {}?", variable))
        .default(true)
        .interact()?
    {
        store.save(variable, mapping, current.iv_total);
        persist(store, options)?;
        print_success(&format!(
            "Saved {} (IV {:.4})",
            variable, current.iv_total
        ));
    }
    Ok(())
}

fn list_saved(store: &CategorizationStore) {
    if store.is_empty() {
        print_info("No saved categorizations yet");
        return;
    }
    println!();
    println!("  {} Saved variables by IV", style("✧").cyan());
    for (variable, iv) in store.ranking() {
        println!("    {:<40} {:.4}", variable, iv);
    }
    println!();
}

fn reset_one(store: &mut CategorizationStore, options: &CategorizeOptions) -> Result<()> {
    if store.is_empty() {
        print_info("No saved categorizations to reset");
        return Ok(());
    }
    let saved: Vec<String> = store.variables().cloned().collect();
    let idx = Select::new()
        .with_prompt("Reset which variable?")
        .items(&saved)
        .default(0)
        .interact()?;
    store.reset(&saved[idx]);
    persist(store, options)?;
    print_success(&format!("Reset {}", saved[idx]));
    Ok(())
}

fn persist(store: &CategorizationStore, options: &CategorizeOptions) -> Result<()> {
    if let Some(path) = &options.session {
        store.persist(path)?;
    }
    Ok(())
}

//! ABT build summary report

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

/// Summary of one ABT build.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub customers: usize,
    pub delinquency_rows: usize,
    pub transactions: usize,
    pub customers_with_history: usize,
    pub abt_rows: usize,
    pub abt_columns: usize,
    load_time: Duration,
    preprocess_time: Duration,
    features_time: Duration,
    save_time: Duration,
}

impl BuildSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = elapsed;
    }

    pub fn set_preprocess_time(&mut self, elapsed: Duration) {
        self.preprocess_time = elapsed;
    }

    pub fn set_features_time(&mut self, elapsed: Duration) {
        self.features_time = elapsed;
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = elapsed;
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("ABT BUILD SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("👤 Customers"), Cell::new(self.customers)]);
        table.add_row(vec![
            Cell::new("📅 Delinquency rows"),
            Cell::new(self.delinquency_rows),
        ]);
        table.add_row(vec![
            Cell::new("💳 Transactions"),
            Cell::new(self.transactions),
        ]);
        table.add_row(vec![
            Cell::new("🔎 Customers with history"),
            Cell::new(self.customers_with_history),
        ]);
        table.add_row(vec![
            Cell::new("✅ ABT rows"),
            Cell::new(self.abt_rows)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🧮 ABT columns"),
            Cell::new(self.abt_columns)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let total =
            self.load_time + self.preprocess_time + self.features_time + self.save_time;
        table.add_row(vec![
            Cell::new("⏱️  Total time"),
            Cell::new(format!("{:.2}s", total.as_secs_f64())),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display_does_not_panic() {
        let mut summary = BuildSummary::new();
        summary.customers = 100;
        summary.delinquency_rows = 600;
        summary.transactions = 5000;
        summary.customers_with_history = 92;
        summary.abt_rows = 600;
        summary.abt_columns = 120;
        summary.set_load_time(Duration::from_millis(120));
        summary.set_features_time(Duration::from_millis(800));
        summary.display();
    }
}

//! Offline rules file validation

use anyhow::Result;
use monitor_lib::rules::RuleCatalog;
use tabled::Tabled;

use crate::output::{print_error, print_success, OutputFormat};

/// Row for the rules table
#[derive(Tabled, serde::Serialize)]
struct RuleRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Comparator")]
    comparator: String,
    #[tabled(rename = "Threshold")]
    threshold: f64,
    #[tabled(rename = "Constraints")]
    constraints: usize,
}

/// Validate a rules file the same way the daemon does at startup.
/// Exits with status 1 when the file is invalid, naming the bad rule.
pub fn check_rules(path: &str, format: OutputFormat) -> Result<()> {
    let catalog = match RuleCatalog::load(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            print_error(&format!("{e}"));
            std::process::exit(1);
        }
    };

    let rows: Vec<RuleRow> = catalog
        .rules()
        .iter()
        .map(|r| RuleRow {
            metric: r.name.clone(),
            comparator: r.comparator.to_string(),
            threshold: r.threshold,
            constraints: r.constraints.len(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                print_success(&format!("{path} is valid but declares no rules"));
                return Ok(());
            }
            let table = tabled::Table::new(&rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            print_success(&format!("{path} is valid ({} rules)", catalog.len()));
        }
    }

    Ok(())
}

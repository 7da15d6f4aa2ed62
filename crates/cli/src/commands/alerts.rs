//! Active alerts listing

use anyhow::Result;
use tabled::Tabled;

use crate::client::{AlertsResponse, ApiClient};
use crate::output::{format_timestamp, format_value, print_success, OutputFormat};

/// Row for the alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Cmp")]
    comparator: String,
    #[tabled(rename = "Firing Since")]
    since: String,
}

/// List currently firing alerts from a running daemon
pub async fn show_alerts(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: AlertsResponse = client.get("/alerts").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            if response.alerts.is_empty() {
                print_success("No alerts firing");
                return Ok(());
            }

            let rows: Vec<AlertRow> = response
                .alerts
                .iter()
                .map(|a| AlertRow {
                    series: a.series.clone(),
                    value: format_value(a.value),
                    threshold: format_value(a.threshold),
                    comparator: a.comparator.clone(),
                    since: format_timestamp(a.since),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} firing", response.total);
        }
    }

    Ok(())
}

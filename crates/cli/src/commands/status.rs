//! Daemon health and readiness display

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, HealthResponse, ReadinessResponse};
use crate::output::{color_status, format_timestamp, OutputFormat};

/// Show daemon health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("/healthz").await?;
    let readiness: ReadinessResponse = client.get("/readyz").await?;

    match format {
        OutputFormat::Json => {
            let combined = serde_json::json!({
                "health": health,
                "readiness": readiness,
            });
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        OutputFormat::Table => {
            println!("{}", "Daemon Status".bold());
            println!("{}", "=".repeat(50));
            println!("Overall:  {}", color_status(&health.status));
            println!(
                "Ready:    {}",
                if readiness.ready {
                    "yes".green().to_string()
                } else {
                    "no".red().to_string()
                }
            );
            if let Some(reason) = &readiness.reason {
                println!("Reason:   {}", reason);
            }
            println!();
            println!("{}", "Components".bold());
            println!("{}", "-".repeat(50));

            let mut names: Vec<&String> = health.components.keys().collect();
            names.sort();
            for name in names {
                let component = &health.components[name];
                let detail = match &component.message {
                    Some(msg) => format!(" ({msg})"),
                    None => String::new(),
                };
                println!(
                    "{:<12} {}{} (last check {})",
                    name,
                    color_status(&component.status),
                    detail,
                    format_timestamp(component.last_check_timestamp)
                );
            }
        }
    }

    Ok(())
}

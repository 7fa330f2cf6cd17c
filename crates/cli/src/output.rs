//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use portal_lib::{HealthStatus, SyncStatus};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes >= GB {
        format!("{:.2}Gi", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes / KB)
    } else {
        format!("{:.0}B", bytes)
    }
}

/// Format fractional cores as human-readable string
pub fn format_cpu(cores: f64) -> String {
    if cores >= 1.0 {
        format!("{:.2}", cores)
    } else {
        format!("{:.0}m", cores * 1000.0)
    }
}

/// Color an application health status
pub fn color_health(health: HealthStatus) -> String {
    match health {
        HealthStatus::Healthy => "Healthy".green().to_string(),
        HealthStatus::Progressing => "Progressing".blue().to_string(),
        HealthStatus::Degraded => "Degraded".red().to_string(),
        HealthStatus::Suspended => "Suspended".yellow().to_string(),
        HealthStatus::Missing => "Missing".red().to_string(),
        HealthStatus::Unknown => "Unknown".to_string(),
    }
}

/// Color a sync status
pub fn color_sync(sync: SyncStatus) -> String {
    match sync {
        SyncStatus::Synced => "Synced".green().to_string(),
        SyncStatus::OutOfSync => "OutOfSync".yellow().to_string(),
        SyncStatus::Unknown => "Unknown".to_string(),
    }
}

/// Color a pod phase
pub fn color_phase(phase: &str) -> String {
    match phase {
        "Running" | "Succeeded" => phase.green().to_string(),
        "Pending" => phase.yellow().to_string(),
        "Failed" => phase.red().to_string(),
        _ => phase.to_string(),
    }
}

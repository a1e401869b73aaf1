//! Status command implementation.

use colored::Colorize;
use hearth_models::{LocalModelService, ModelStatus};
use serde::Serialize;

/// One row of JSON output.
#[derive(Debug, Serialize)]
pub struct StatusRow<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub status: &'a ModelStatus,
}

/// Execute the status command.
pub async fn execute(service: &LocalModelService, json_output: bool) -> anyhow::Result<()> {
    let statuses = service.get_all_model_statuses().await;

    if json_output {
        println!("{}", to_json(&statuses)?);
    } else {
        render(service, &statuses).await;
    }

    Ok(())
}

/// Serialize statuses as a JSON array of rows.
pub fn to_json(statuses: &[(String, ModelStatus)]) -> serde_json::Result<String> {
    let rows: Vec<StatusRow<'_>> =
        statuses.iter().map(|(name, status)| StatusRow { name, status }).collect();
    serde_json::to_string_pretty(&rows)
}

/// Print the human-readable status table.
pub async fn render(service: &LocalModelService, statuses: &[(String, ModelStatus)]) {
    println!();
    println!(
        "{}",
        format!("Local Models ({})", statuses.len()).bold().cyan()
    );
    println!("  Server: {}", service.get_base_address().dimmed());
    println!();

    if statuses.is_empty() {
        if service.is_running().await {
            println!("  {}", "No models installed.".dimmed());
            println!("  {}", "Pull one with 'ollama pull llama3.2:1b'".dimmed());
        } else {
            println!("  {}", "Ollama is not reachable.".yellow());
            println!("  {}", "Start it with 'ollama serve'".dimmed());
        }
        println!();
        return;
    }

    // Table header
    println!("{:<32} {:<10} {:<12} {}", "Name", "Size", "Load time", "Status");
    println!("{}", "─".repeat(72));

    for (name, status) in statuses {
        let size = status.memory_bytes.map_or_else(|| "-".to_string(), human_size);
        let load_time =
            status.load_time_ms.map_or_else(|| "-".to_string(), |ms| format!("{ms} ms"));
        let status_str = if let Some(error) = &status.error {
            format!("✗ {error}").red()
        } else if status.is_loaded {
            "● loaded".green()
        } else if status.is_available {
            "○ available".yellow()
        } else {
            "✗ unavailable".red()
        };

        println!("{:<32} {:<10} {:<12} {}", name.cyan(), size, load_time, status_str);
    }

    println!();
}

/// Format a byte count with a binary-prefixed unit.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(4_500_000_000), "4.2 GB");
    }

    #[test]
    fn test_to_json_flattens_status() {
        let statuses = vec![(
            "phi3".to_string(),
            ModelStatus::loaded(Duration::from_millis(800)).with_memory_bytes(Some(2_000)),
        )];

        let json: serde_json::Value = serde_json::from_str(&to_json(&statuses).unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "name": "phi3",
                "isLoaded": true,
                "isAvailable": true,
                "loadTimeMs": 800,
                "memoryBytes": 2000
            }])
        );
    }

    #[test]
    fn test_to_json_empty() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}

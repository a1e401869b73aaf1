//! Ping command implementation.

use anyhow::bail;
use colored::Colorize;
use hearth_models::LocalModelService;

/// Execute the ping command.
pub async fn execute(service: &LocalModelService) -> anyhow::Result<()> {
    let base_url = service.get_base_address();
    if service.is_running().await {
        println!("{} Ollama is running at {}", "✓".green(), base_url.cyan());
        Ok(())
    } else {
        bail!("Ollama is not running at {base_url}. Start it with 'ollama serve'.")
    }
}

//! Models command implementation.

use super::types::ModelsCommand;
use anyhow::{bail, Result};
use colored::Colorize;
use hearth_models::LocalModelService;

use super::status::human_size;

/// Execute the models command.
pub async fn execute(service: &LocalModelService, command: ModelsCommand) -> Result<()> {
    match command {
        ModelsCommand::List { json } => list_models(service, json).await,
        ModelsCommand::Check { name } => check_model(service, &name).await,
        ModelsCommand::Load { name } => load_model(service, &name).await,
        ModelsCommand::Unload { name } => unload_model(service, &name).await,
    }
}

/// List installed models without probing residency.
async fn list_models(service: &LocalModelService, json_output: bool) -> Result<()> {
    let models = service.list_models().await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Installed Models ({})", models.len()).bold().cyan());
    println!();

    if models.is_empty() {
        println!("  {}", "No models found (or Ollama is not reachable).".dimmed());
        println!();
        return Ok(());
    }

    println!("{:<32} {:<10} {:<10} {}", "Name", "Size", "Params", "Quantization");
    println!("{}", "─".repeat(72));

    for model in &models {
        let details = model.details.as_ref();
        println!(
            "{:<32} {:<10} {:<10} {}",
            model.name.cyan(),
            model.size.map_or_else(|| "-".to_string(), human_size),
            details.and_then(|d| d.parameter_size.as_deref()).unwrap_or("-"),
            details.and_then(|d| d.quantization_level.as_deref()).unwrap_or("-").dimmed(),
        );
    }

    println!();
    Ok(())
}

async fn check_model(service: &LocalModelService, name: &str) -> Result<()> {
    if service.is_model_loaded(name).await {
        println!("{} {} is loaded", "●".green(), name.cyan());
    } else {
        println!("{} {} is not loaded", "○".yellow(), name.cyan());
        if let Some(error) = service.cached_status(name).and_then(|status| status.error) {
            println!("  {}", error.dimmed());
        }
    }
    Ok(())
}

async fn load_model(service: &LocalModelService, name: &str) -> Result<()> {
    println!("Loading {}...", name.cyan());

    if service.load_model(name).await {
        let load_time = service
            .cached_status(name)
            .and_then(|status| status.load_time_ms)
            .map_or_else(String::new, |ms| format!(" in {ms} ms"));
        println!("{} Loaded {}{}", "✓".green(), name.cyan(), load_time);
        Ok(())
    } else {
        let reason = service
            .cached_status(name)
            .and_then(|status| status.error)
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("Failed to load '{name}': {reason}")
    }
}

async fn unload_model(service: &LocalModelService, name: &str) -> Result<()> {
    service.unload_model(name).await;
    println!("{} Forgot cached status for {}", "✓".green(), name.cyan());
    println!(
        "  {}",
        "Ollama evicts idle models on its own; no memory was freed by this command.".dimmed()
    );
    Ok(())
}

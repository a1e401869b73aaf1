//! Watch command implementation.
//!
//! This is the polling consumer: the status layer itself never polls.

use anyhow::{bail, Result};
use colored::Colorize;
use hearth_models::LocalModelService;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::status;

/// Execute the watch command.
pub async fn execute(
    service: &LocalModelService,
    interval_secs: u64,
    iterations: Option<u64>,
    json_output: bool,
) -> Result<()> {
    run(service, interval_secs, iterations, json_output, tokio::signal::ctrl_c()).await
}

/// Refresh until `iterations` is reached or `stop` resolves.
///
/// `stop` is polled for the whole run, including while a refresh is waiting
/// on the server.
async fn run<F: Future>(
    service: &LocalModelService,
    interval_secs: u64,
    iterations: Option<u64>,
    json_output: bool,
    stop: F,
) -> Result<()> {
    if interval_secs == 0 {
        bail!("Interval must be greater than 0");
    }

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(stop);

    let mut refreshes = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop => {
                debug!(refreshes, "Watch interrupted");
                break;
            }
        }

        let statuses = tokio::select! {
            statuses = service.get_all_model_statuses() => statuses,
            _ = &mut stop => {
                debug!(refreshes, "Watch interrupted during refresh");
                break;
            }
        };

        if json_output {
            // One compact JSON document per line.
            let rows: serde_json::Value = serde_json::from_str(&status::to_json(&statuses)?)?;
            println!("{rows}");
        } else {
            status::render(service, &statuses).await;
            println!(
                "  {}",
                format!("Refreshing every {interval_secs}s. Press Ctrl-C to stop.").dimmed()
            );
        }

        refreshes += 1;
        if iterations.is_some_and(|limit| refreshes >= limit) {
            break;
        }
    }

    Ok(())
}

use crate::cli::input::collect_identifiers;
use crate::fetcher::HttpFetcher;
use crate::models::TrackerConfig;
use crate::notifier::ConsoleNotifier;
use crate::tracking::Supervisor;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

pub async fn run(ids: &[String], config_path: Option<&Path>) -> Result<()> {
    let config = TrackerConfig::load(config_path)?;

    let identifiers = collect_identifiers(ids)?;
    if identifiers.is_empty() {
        println!("{}", "No tracking ids given, nothing to do.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "📦 Tracking {} id(s), checking every {}s. Press Ctrl-C to stop.",
            identifiers.len(),
            config.poll_interval_secs
        )
        .cyan()
    );
    for id in &identifiers {
        println!("   • {}", id);
    }

    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let notifier = Arc::new(
        ConsoleNotifier::stdout(config.bell).with_sound_command(config.sound_command.clone()),
    );
    let supervisor = Supervisor::new(config, fetcher, notifier);

    let outcome = supervisor.run(&identifiers).await?;

    if outcome.interrupted {
        println!("{}", "⏹  Stopped.".yellow());
    }
    Ok(())
}

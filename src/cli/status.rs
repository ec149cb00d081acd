use crate::models::TrackerConfig;
use crate::state::SnapshotStore;
use crate::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(id: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = TrackerConfig::load(config_path)?;
    let store = SnapshotStore::new(&config.storage_dir);

    if !store.path_for(id).exists() {
        if json {
            println!("[]");
        } else {
            println!("{}", format!("No saved status for '{}' yet", id).yellow());
        }
        return Ok(());
    }

    let snapshot = store.load(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", format!("Status history for: {}", id).cyan().bold());
    println!();
    if snapshot.is_empty() {
        println!("   (no events)");
    }
    for record in &snapshot {
        println!("   • {}", record);
    }

    Ok(())
}

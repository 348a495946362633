use anyhow::Result;
use cfgsync_core::{Config, FileStateStore};
use colored::Colorize;

pub fn run(config: Config, limit: usize) -> Result<()> {
    let store = FileStateStore::new(config.hash_marker_path(), config.log_path());
    let lines = store.tail_log(limit)?;

    if lines.is_empty() {
        println!("{}", "No sync activity yet".yellow());
        return Ok(());
    }

    println!("{}", "Sync Log".bold().cyan());
    println!();

    for line in &lines {
        match line.split_once("] ") {
            Some((stamp, message)) if stamp.starts_with('[') => {
                println!("{}] {}", stamp.dimmed(), message);
            }
            _ => println!("{}", line),
        }
    }

    Ok(())
}

use crate::prompt::TerminalPrompt;
use anyhow::{Context, Result};
use cfgsync_core::Config;
use cfgsync_daemon::SyncDaemon;
use colored::Colorize;
use std::sync::Arc;

pub async fn run(config: Config, skip_first_remote_check: bool) -> Result<()> {
    let prompt = Arc::new(TerminalPrompt::new(&config));
    let mirror = config.mirror_dir.clone();
    let interval = config.poll_interval;

    let daemon = SyncDaemon::open(config, prompt).context("Failed to start cfgsync")?;

    println!("{}", "Starting cfgsync...".bold().cyan());
    println!("   {}: {}", "Mirror".bold(), mirror.display());
    println!(
        "   {}: every {}s",
        "Polling".bold(),
        interval.as_secs().to_string().green()
    );
    if skip_first_remote_check {
        println!("   {}", "Skipping the first remote check".dimmed());
    }
    println!();
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();

    daemon.serve(skip_first_remote_check).await?;

    Ok(())
}

use super::spinner;
use crate::prompt::TerminalPrompt;
use anyhow::{Context, Result};
use cfgsync_core::Config;
use cfgsync_daemon::{register_service, Installer, ServiceKind};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

pub fn run(
    config: Config,
    config_path: Option<PathBuf>,
    remote: String,
    with_service: bool,
) -> Result<()> {
    let prompt = Arc::new(TerminalPrompt::new(&config));
    let mirror = config.mirror_dir.clone();

    let progress = spinner(format!("Setting up mirror from {}", remote));
    let result = Installer::new(config).install(&remote, prompt);
    progress.finish_and_clear();
    let report = result.context("Installation failed")?;

    println!("{}", "cfgsync installed".bold().green());
    println!("   {}: {}", "Mirror".bold(), mirror.display());
    println!(
        "   {}: {}",
        "Clone".bold(),
        if report.cloned { "new" } else { "reused" }
    );
    for name in &report.seeded {
        println!("   {} {}", "seeded".yellow(), name);
    }
    for backup in &report.backups {
        println!("   {} {}", "backup".dimmed(), backup.display());
    }
    for link in &report.linked {
        println!("   {} {}", "linked".green(), link.display());
    }
    match &report.acknowledged {
        Some(tip) => println!("   {}: {}", "Remote tip".bold(), tip.short().yellow()),
        None => println!("   {}", "No remote tip acknowledged yet".dimmed()),
    }
    if let Some(extensions) = &report.extensions {
        if extensions.skipped {
            println!("   {}", "Editor is running, extensions not synced".dimmed());
        }
        for id in &extensions.installed {
            println!("   {} {}", "installed".green(), id);
        }
        for id in &extensions.failed {
            println!("   {} {}", "failed".red(), id);
        }
    }

    if with_service {
        let exe = std::env::current_exe().context("Could not locate the cfgsync binary")?;
        let path = register_service(&exe, config_path.as_deref())?;
        println!();
        println!("   {}: {}", "Service".bold(), path.display());
        match ServiceKind::current() {
            Some(ServiceKind::SystemdUser) => println!(
                "Run {} to start it",
                "systemctl --user enable --now cfgsync.service".cyan()
            ),
            Some(ServiceKind::LaunchAgent) => println!(
                "Run {} to start it",
                format!("launchctl load {}", path.display()).cyan()
            ),
            None => {}
        }
    } else {
        println!();
        println!("Run {} to start syncing", "cfgsync run --skip-first-remote-check".cyan());
    }

    Ok(())
}

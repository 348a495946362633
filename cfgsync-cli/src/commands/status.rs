use crate::display::status_label;
use anyhow::Result;
use cfgsync_core::local::{committed_copy, compare};
use cfgsync_core::ports::{RepositoryBackend, StateStore};
use cfgsync_core::{Config, FileStateStore};
use cfgsync_daemon::GitCli;
use colored::Colorize;

pub fn run(config: Config) -> Result<()> {
    if !super::check_initialized(&config) {
        return Ok(());
    }

    let repo = GitCli::new(&config.mirror_dir, &config.remote);
    let store = FileStateStore::new(config.hash_marker_path(), config.log_path());

    println!("{}", "Mirror Status".bold().cyan());
    println!("  {}: {}", "Mirror".bold(), config.mirror_dir.display());
    println!("  {}: {}", "Editor".bold(), config.editor.user_dir.display());
    println!("  {}: {}", "Remote".bold(), config.remote);

    match repo.head() {
        Ok(head) => println!("  {}: {}", "HEAD".bold(), head.short().yellow()),
        Err(e) => println!("  {}: {}", "HEAD".bold(), e.to_string().red()),
    }
    // As of the last fetch; status never touches the network.
    match repo.remote_tip(&config.remote_branches) {
        Ok(tip) => println!("  {}: {}", "Remote tip".bold(), tip.short().yellow()),
        Err(e) => println!("  {}: {}", "Remote tip".bold(), e.to_string().red()),
    }
    match (store.acknowledged()?, store.acknowledged_at()?) {
        (Some(id), Some(at)) => println!(
            "  {}: {} ({})",
            "Acknowledged".bold(),
            id.short().yellow(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        (Some(id), None) => println!("  {}: {}", "Acknowledged".bold(), id.short().yellow()),
        (None, _) => println!("  {}: {}", "Acknowledged".bold(), "none".dimmed()),
    }
    println!();

    println!("{}", "Tracked files".bold());
    for file in &config.tracked {
        let linked = if file.is_linked() {
            " (linked)".dimmed().to_string()
        } else {
            String::new()
        };
        let Ok(local) = std::fs::read_to_string(&file.local_path) else {
            println!("  {} {}", file.name, "missing locally".red());
            continue;
        };
        let mirror = committed_copy(&repo, file)?.unwrap_or_default();
        println!(
            "  {} {}{}",
            file.name,
            status_label(compare(file, &local, &mirror)),
            linked
        );
    }

    Ok(())
}

use super::spinner;
use crate::prompt::{AssumeYes, TerminalPrompt};
use anyhow::{Context, Result};
use cfgsync_core::conflict::Resolution;
use cfgsync_core::ports::ConfirmationBackend;
use cfgsync_core::reconcile::Reconciler;
use cfgsync_core::remote::{RemoteDrift, RemoteDriftDetector};
use cfgsync_core::scheduler::pull_prompt;
use cfgsync_core::Config;
use cfgsync_daemon::SyncDaemon;
use colored::Colorize;
use std::sync::Arc;

pub fn run(config: Config, yes: bool) -> Result<()> {
    super::require_initialized(&config)?;
    let prompt: Arc<dyn ConfirmationBackend + Send + Sync> = if yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(TerminalPrompt::new(&config))
    };
    let daemon = SyncDaemon::open(config, prompt)?;
    let ctx = daemon.context();

    let progress = spinner(format!("Fetching from {}", ctx.config.remote));
    let drift = RemoteDriftDetector::new(ctx).check();
    progress.finish_and_clear();

    let (tip, preview) = match drift? {
        RemoteDrift::Significant { tip, preview } => (tip, preview),
        RemoteDrift::WhitespaceOnly { tip } => {
            println!(
                "{} {}",
                "Remote differs only in whitespace, acknowledged".green(),
                tip.short().yellow()
            );
            return Ok(());
        }
        _ => {
            println!("{}", "Already up to date".green());
            return Ok(());
        }
    };

    if !ctx.prompt.confirm(&pull_prompt(ctx, &tip, preview)) {
        ctx.journal("Pull declined");
        println!("{}", "Pull declined".yellow());
        return Ok(());
    }

    let progress = spinner(format!("Pulling from {}", ctx.config.remote));
    let result = Reconciler::new(ctx).pull();
    progress.finish_and_clear();
    let outcome = result.context("Pull failed")?;

    println!("{} {}", "Pulled".green().bold(), outcome.head.short().yellow());
    if let Resolution::Resolved { files, archive } = &outcome.resolution {
        for file in files {
            println!("  {} {}", "kept local".yellow(), file.display());
        }
        if let Some(archive) = archive {
            println!(
                "  {}: {}",
                "Remote side archived in".bold(),
                archive.display()
            );
        }
    }
    for id in &outcome.extensions.installed {
        println!("  {} {}", "installed".green(), id);
    }
    for id in &outcome.extensions.failed {
        println!("  {} {}", "failed".red(), id);
    }

    Ok(())
}

use super::spinner;
use crate::prompt::{AssumeYes, TerminalPrompt};
use anyhow::{Context, Result};
use cfgsync_core::local::LocalDriftDetector;
use cfgsync_core::ports::ConfirmationBackend;
use cfgsync_core::reconcile::Reconciler;
use cfgsync_core::scheduler::push_prompt;
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

    let drift = LocalDriftDetector::new(ctx).detect()?;
    if !drift.has_drift() {
        println!("{}", "Nothing to push".green());
        return Ok(());
    }

    if !ctx.prompt.confirm(&push_prompt(ctx, &drift)) {
        ctx.journal("Push declined");
        println!("{}", "Push declined".yellow());
        return Ok(());
    }

    let progress = spinner(format!("Pushing to {}", ctx.config.remote));
    let result = Reconciler::new(ctx).push();
    progress.finish_and_clear();
    let head = result.context("Push failed")?;

    println!("{} {}", "Pushed".green().bold(), head.short().yellow());
    Ok(())
}

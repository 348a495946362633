use crate::display::print_preview;
use crate::prompt::AssumeYes;
use anyhow::Result;
use cfgsync_core::diff::{DiffPreview, FileDiff};
use cfgsync_core::local::committed_copy;
use cfgsync_core::ports::RepositoryBackend;
use cfgsync_core::remote::RemoteDriftDetector;
use cfgsync_core::Config;
use cfgsync_daemon::Backends;
use colored::Colorize;
use std::sync::Arc;

pub fn run(config: Config) -> Result<()> {
    if !super::check_initialized(&config) {
        return Ok(());
    }
    let backends = Backends::new(config, Arc::new(AssumeYes))?;
    let ctx = backends.context();

    let mut local = DiffPreview::new("Local changes not yet in the mirror");
    for file in &ctx.config.tracked {
        local.push(FileDiff::between(
            &file.repo_path,
            committed_copy(ctx.repo, file)?,
            std::fs::read_to_string(&file.local_path).ok(),
        ));
    }
    print_preview(&local);

    // Incoming side as of the last fetch.
    let head = backends.repo.head()?;
    match backends.repo.remote_tip(&ctx.config.remote_branches) {
        Ok(tip) if tip == head => {
            println!("{}", "Mirror is at the remote tip".green());
        }
        Ok(tip) => print_preview(&RemoteDriftDetector::new(ctx).preview(&head, &tip)?),
        Err(e) => println!("{}", e.to_string().red()),
    }

    Ok(())
}

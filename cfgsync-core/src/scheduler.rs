use crate::context::SyncContext;
use crate::diff::DiffPreview;
use crate::local::{LocalDrift, LocalDriftDetector};
use crate::models::CommitId;
use crate::ports::Prompt;
use crate::reconcile::Reconciler;
use crate::remote::{RemoteDrift, RemoteDriftDetector};
use tracing::{debug, warn};

/// What one pass of the loop did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    pub push_offered: bool,
    pub pushed: bool,
    pub remote_checked: bool,
    pub pull_offered: bool,
    pub pulled: bool,
}

/// State carried between iterations of the polling loop.
///
/// The loop itself (sleeping between iterations) is driven by the caller;
/// every iteration runs to completion before the next one starts.
#[derive(Debug, Clone)]
pub struct Scheduler {
    skip_remote_once: bool,
    iterations: u64,
}

impl Scheduler {
    /// `skip_first_remote_check` suppresses the remote check of the first
    /// iteration only.
    pub fn new(skip_first_remote_check: bool) -> Self {
        Self {
            skip_remote_once: skip_first_remote_check,
            iterations: 0,
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Local check and optional push, then remote check and optional pull.
    /// Failures are logged and left for the next iteration.
    pub fn run_iteration(&mut self, ctx: SyncContext<'_>) -> IterationReport {
        self.iterations += 1;
        debug!("Starting iteration {}", self.iterations);

        let mut report = IterationReport::default();
        let reconciler = Reconciler::new(ctx);

        let local = LocalDriftDetector::new(ctx);
        match local.detect() {
            Ok(drift) if drift.has_drift() => {
                report.push_offered = true;
                if ctx.prompt.confirm(&push_prompt(ctx, &drift)) {
                    match reconciler.push() {
                        Ok(_) => report.pushed = true,
                        Err(e) => {
                            warn!("Push failed: {}", e);
                            ctx.journal(&format!("Push failed: {}", e));
                        }
                    }
                } else {
                    ctx.journal("Push declined");
                }
            }
            Ok(_) => debug!("No local drift"),
            Err(e) => warn!("Local drift check failed: {}", e),
        }

        let skip = std::mem::take(&mut self.skip_remote_once);
        report.remote_checked = !skip;

        match RemoteDriftDetector::new(ctx).detect(skip) {
            Ok(RemoteDrift::Significant { tip, preview }) => {
                report.pull_offered = true;
                if ctx.prompt.confirm(&pull_prompt(ctx, &tip, preview)) {
                    match reconciler.pull() {
                        Ok(_) => report.pulled = true,
                        Err(e) => warn!("Pull failed: {}", e),
                    }
                } else {
                    ctx.journal("Pull declined");
                }
            }
            Ok(other) => debug!("Remote drift check: {:?}", other),
            Err(e) => warn!("Remote drift check failed: {}", e),
        }

        report
    }
}

/// Confirmation offered when local files drifted from the mirror.
pub fn push_prompt(ctx: SyncContext<'_>, drift: &LocalDrift) -> Prompt {
    let names = drift
        .drifted()
        .map(|r| r.file.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let prompt = Prompt::new(
        "Push local settings?",
        format!("{} changed locally. Push to {}?", names, ctx.config.remote),
    );
    match LocalDriftDetector::new(ctx).preview(drift) {
        Ok(preview) => prompt.with_preview(preview),
        Err(e) => {
            warn!("Could not render local diff: {}", e);
            prompt
        }
    }
}

pub fn pull_prompt(ctx: SyncContext<'_>, tip: &CommitId, preview: DiffPreview) -> Prompt {
    Prompt::new(
        "Pull remote settings?",
        format!(
            "{} has new settings ({}). Pull them?",
            ctx.config.remote,
            tip.short()
        ),
    )
    .with_preview(preview)
}

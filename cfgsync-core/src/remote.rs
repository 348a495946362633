use crate::config::ClassificationStrategy;
use crate::context::SyncContext;
use crate::diff::{DiffPreview, FileDiff};
use crate::error::Result;
use crate::models::CommitId;
use crate::normalize::differs_beyond_whitespace;
use crate::ports::MergeStatus;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// First iteration after installation.
    SkipFlag,
    /// The acknowledged hash was written too recently.
    Debounce,
}

#[derive(Debug, Clone)]
pub enum RemoteDrift {
    Skipped(SkipReason),
    UpToDate,
    AlreadyAcknowledged,
    WhitespaceOnly { tip: CommitId },
    Significant { tip: CommitId, preview: DiffPreview },
}

impl RemoteDrift {
    pub fn is_significant(&self) -> bool {
        matches!(self, RemoteDrift::Significant { .. })
    }
}

/// What merging the remote tip would bring into one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    Untouched,
    WhitespaceOnly,
    Significant,
}

/// Classifies the remote's change to one file from its content at the merge
/// base and at the remote tip. Local commits since the base play no part:
/// merging brings in only what the remote changed. A file the remote did not
/// touch is absent from the incoming diff.
pub fn classify_incoming(base: Option<&str>, theirs: Option<&str>) -> Incoming {
    if theirs == base {
        return Incoming::Untouched;
    }
    if differs_beyond_whitespace(base.unwrap_or(""), theirs.unwrap_or("")) {
        Incoming::Significant
    } else {
        Incoming::WhitespaceOnly
    }
}

pub struct RemoteDriftDetector<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> RemoteDriftDetector<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn detect(&self, skip: bool) -> Result<RemoteDrift> {
        if skip {
            debug!("Remote check skipped for this iteration");
            return Ok(RemoteDrift::Skipped(SkipReason::SkipFlag));
        }
        if self.within_debounce()? {
            debug!("Acknowledged hash updated recently, skipping remote check");
            return Ok(RemoteDrift::Skipped(SkipReason::Debounce));
        }
        self.check()
    }

    /// Fetches and classifies without the skip flag or debounce window.
    pub fn check(&self) -> Result<RemoteDrift> {
        let repo = self.ctx.repo;
        repo.fetch()?;

        let head = repo.head()?;
        let tip = repo.remote_tip(&self.ctx.config.remote_branches)?;
        if head == tip {
            return Ok(RemoteDrift::UpToDate);
        }
        if self.ctx.store.acknowledged()?.as_ref() == Some(&tip) {
            return Ok(RemoteDrift::AlreadyAcknowledged);
        }

        let significant = match self.ctx.config.classification {
            ClassificationStrategy::Tree => self.classify_tree(&head, &tip)?,
            ClassificationStrategy::ScratchBranch => self.classify_scratch(&tip)?,
        };

        if significant {
            self.ctx.journal(&format!(
                "Remote {} has significant changes",
                tip.short()
            ));
            let preview = self.preview(&head, &tip)?;
            Ok(RemoteDrift::Significant { tip, preview })
        } else {
            self.ctx.store.acknowledge(&tip)?;
            self.ctx.journal(&format!(
                "Remote {} differs only in whitespace, acknowledged",
                tip.short()
            ));
            Ok(RemoteDrift::WhitespaceOnly { tip })
        }
    }

    fn within_debounce(&self) -> Result<bool> {
        let Some(written) = self.ctx.store.acknowledged_at()? else {
            return Ok(false);
        };
        let elapsed = self.ctx.clock.now().signed_duration_since(written);
        Ok(match elapsed.to_std() {
            Ok(elapsed) => elapsed < self.ctx.config.debounce,
            // marker written in the future (clock skew)
            Err(_) => false,
        })
    }

    fn tracked_repo_paths(&self) -> Vec<PathBuf> {
        self.ctx
            .config
            .tracked
            .iter()
            .map(|t| t.repo_path.clone())
            .collect()
    }

    fn classify_tree(&self, head: &CommitId, tip: &CommitId) -> Result<bool> {
        let repo = self.ctx.repo;
        let base = repo.merge_base(head, tip)?;

        for path in self.tracked_repo_paths() {
            let base_content = match &base {
                Some(base) => repo.show_file(base, &path)?,
                // unrelated histories, measure against HEAD
                None => repo.show_file(head, &path)?,
            };
            let theirs = repo.show_file(tip, &path)?;

            match classify_incoming(base_content.as_deref(), theirs.as_deref()) {
                Incoming::Untouched => debug!("{}: not changed by remote", path.display()),
                Incoming::WhitespaceOnly => self.ctx.journal(&format!(
                    "{}: remote change is whitespace-only",
                    path.display()
                )),
                Incoming::Significant => return Ok(true),
            }
        }

        Ok(false)
    }

    /// Merges the tip into a disposable branch and inspects the staged diff.
    /// The disposable branch is removed on every path out of here.
    fn classify_scratch(&self, tip: &CommitId) -> Result<bool> {
        let repo = self.ctx.repo;
        let original = repo.current_branch()?;
        let simple = Uuid::new_v4().simple().to_string();
        let probe = format!("cfgsync-probe-{}", &simple[..8]);

        repo.create_branch(&probe)?;
        let outcome = self.inspect_merge(tip);

        if let Err(e) = repo.abort_merge() {
            debug!("No merge to abort on {}: {}", probe, e);
        }
        let restored = repo.checkout(&original);
        if let Err(e) = repo.delete_branch(&probe) {
            warn!("Failed to delete disposable branch {}: {}", probe, e);
        }
        restored?;

        outcome
    }

    fn inspect_merge(&self, tip: &CommitId) -> Result<bool> {
        let repo = self.ctx.repo;
        if repo.merge_no_commit(tip)? == MergeStatus::Conflicted {
            return Ok(true);
        }
        for path in self.tracked_repo_paths() {
            if !repo.staged_diff_ignoring_whitespace(&path)?.trim().is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rendered diff of the tracked files and manifest between two commits.
    pub fn preview(&self, head: &CommitId, tip: &CommitId) -> Result<DiffPreview> {
        let mut preview = DiffPreview::new(format!(
            "Incoming changes from {} ({})",
            self.ctx.config.remote,
            tip.short()
        ));
        for path in self.ctx.config.watched_repo_paths() {
            preview.push(file_diff(self.ctx, head, tip, &path)?);
        }
        Ok(preview)
    }
}

fn file_diff(
    ctx: SyncContext<'_>,
    from: &CommitId,
    to: &CommitId,
    path: &Path,
) -> Result<FileDiff> {
    Ok(FileDiff::between(
        path,
        ctx.repo.show_file(from, path)?,
        ctx.repo.show_file(to, path)?,
    ))
}

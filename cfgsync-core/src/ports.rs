//! Capability sets the reconciliation logic is written against.
//!
//! Real implementations shell out to git and the editor CLI (`cfgsync-daemon`)
//! or talk to the terminal (`cfgsync-cli`); tests substitute in-memory fakes.

use crate::diff::DiffPreview;
use crate::error::Result;
use crate::models::CommitId;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Outcome of merging without committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    Clean,
    Conflicted,
}

/// Index stage of a conflicted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    Ours,
    Theirs,
}

/// Version-control operations on the mirror repository.
///
/// Paths are relative to the repository root.
pub trait RepositoryBackend {
    fn head(&self) -> Result<CommitId>;

    /// Tip of the first remote-tracking branch in `branches` that exists.
    fn remote_tip(&self, branches: &[String]) -> Result<CommitId>;

    fn fetch(&self) -> Result<()>;

    fn merge_base(&self, a: &CommitId, b: &CommitId) -> Result<Option<CommitId>>;

    /// Content of `path` at `rev`, `None` when the file does not exist there.
    fn show_file(&self, rev: &CommitId, path: &Path) -> Result<Option<String>>;

    fn current_branch(&self) -> Result<String>;

    /// Creates `name` at the current commit and switches to it.
    fn create_branch(&self, name: &str) -> Result<()>;

    fn checkout(&self, name: &str) -> Result<()>;

    fn delete_branch(&self, name: &str) -> Result<()>;

    fn merge_no_commit(&self, rev: &CommitId) -> Result<MergeStatus>;

    fn abort_merge(&self) -> Result<()>;

    /// Staged diff of `path`, ignoring whitespace and blank-line-only hunks.
    fn staged_diff_ignoring_whitespace(&self, path: &Path) -> Result<String>;

    fn stage_all(&self) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    fn push(&self) -> Result<()>;

    fn pull(&self) -> Result<()>;

    /// Files the index reports as modified (or added) on both sides.
    fn conflicted_files(&self) -> Result<Vec<PathBuf>>;

    fn checkout_ours(&self, path: &Path) -> Result<()>;

    fn show_stage(&self, path: &Path, side: ConflictSide) -> Result<Option<String>>;
}

/// A yes/no question for the operator.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub title: String,
    pub body: String,
    pub preview: Option<DiffPreview>,
}

impl Prompt {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: DiffPreview) -> Self {
        self.preview = Some(preview);
        self
    }
}

pub trait ConfirmationBackend {
    fn notify(&self, title: &str, body: &str);

    /// Blocks until the operator answers. A dismissed prompt counts as "no".
    fn confirm(&self, prompt: &Prompt) -> bool;
}

/// The editor's extension manager and process.
pub trait EditorBackend {
    fn is_running(&self) -> bool;

    fn installed_extensions(&self) -> Result<Vec<String>>;

    fn install_extension(&self, id: &str) -> Result<()>;
}

/// Persisted acknowledged hash and the append-only sync log.
pub trait StateStore {
    fn acknowledged(&self) -> Result<Option<CommitId>>;

    /// When the acknowledged hash was last written.
    fn acknowledged_at(&self) -> Result<Option<DateTime<Utc>>>;

    fn acknowledge(&self, id: &CommitId) -> Result<()>;

    fn append_log(&self, line: &str) -> Result<()>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

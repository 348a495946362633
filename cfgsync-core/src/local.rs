use crate::context::SyncContext;
use crate::diff::{DiffPreview, FileDiff};
use crate::error::Result;
use crate::models::{FileStatus, TrackedFile};
use crate::normalize::{fingerprint, lines_match_trimmed, normalize};
use crate::ports::RepositoryBackend;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: TrackedFile,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct LocalDrift {
    pub files: Vec<FileReport>,
}

impl LocalDrift {
    pub fn has_drift(&self) -> bool {
        self.files
            .iter()
            .any(|report| report.status == FileStatus::Significant)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|report| report.status == FileStatus::Significant)
    }
}

/// Compares each tracked local file against the copy committed at the
/// mirror's HEAD.
pub struct LocalDriftDetector<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> LocalDriftDetector<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    /// Files whose local copy is missing are left out of the report.
    pub fn detect(&self) -> Result<LocalDrift> {
        let mut drift = LocalDrift::default();

        for file in &self.ctx.config.tracked {
            let Some(local) = read_optional(&file.local_path)? else {
                debug!("{} has no local copy, skipping", file.name);
                continue;
            };
            let mirror = committed_copy(self.ctx.repo, file)?.unwrap_or_default();

            let status = compare(file, &local, &mirror);
            match status {
                FileStatus::Identical => debug!("{} matches the committed copy", file.name),
                FileStatus::WhitespaceOnly => self.ctx.journal(&format!(
                    "{}: whitespace-only change, ignoring",
                    file.name
                )),
                FileStatus::Significant => self.ctx.journal(&format!(
                    "{}: significant local change ({} -> {})",
                    file.name,
                    fingerprint(&mirror, file.kind),
                    fingerprint(&local, file.kind)
                )),
            }

            drift.files.push(FileReport {
                file: file.clone(),
                status,
            });
        }

        Ok(drift)
    }

    /// Committed-to-local diff of every drifted file.
    pub fn preview(&self, drift: &LocalDrift) -> Result<DiffPreview> {
        let mut preview = DiffPreview::new("Local changes not yet in the mirror");
        for report in drift.drifted() {
            let file = &report.file;
            preview.push(FileDiff::between(
                &file.repo_path,
                committed_copy(self.ctx.repo, file)?,
                read_optional(&file.local_path)?,
            ));
        }
        Ok(preview)
    }
}

/// The file as of the mirror's HEAD. A symlinked local file and its mirror
/// copy are the same inode, so only the commit shows what was last pushed.
/// Falls back to the work tree when HEAD does not resolve (no commits yet).
pub fn committed_copy(
    repo: &dyn RepositoryBackend,
    file: &TrackedFile,
) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) => repo.show_file(&head, &file.repo_path),
        Err(e) => {
            debug!("HEAD unavailable ({}), reading {} from the work tree", e, file.name);
            read_optional(&file.mirror_path)
        }
    }
}

/// Classifies the difference between a local file and its mirror copy.
pub fn compare(file: &TrackedFile, local: &str, mirror: &str) -> FileStatus {
    if lines_match_trimmed(local, mirror) {
        FileStatus::Identical
    } else if normalize(local, file.kind) == normalize(mirror, file.kind) {
        FileStatus::WhitespaceOnly
    } else {
        FileStatus::Significant
    }
}

pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

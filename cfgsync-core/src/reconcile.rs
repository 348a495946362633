use crate::conflict::{ConflictResolver, Resolution};
use crate::context::SyncContext;
use crate::error::Result;
use crate::local::{committed_copy, compare, read_optional};
use crate::models::{CommitId, FileStatus, TrackedFile};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub head: CommitId,
    pub resolution: Resolution,
    pub extensions: ExtensionSync,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSync {
    /// The editor was running, nothing was read or installed.
    pub skipped: bool,
    pub installed: Vec<String>,
    pub failed: Vec<String>,
}

/// Carries out the direction the operator chose.
pub struct Reconciler<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    /// Copies local files into the mirror, commits and pushes. The
    /// acknowledged hash only moves when every step succeeds; an empty commit
    /// counts as a failure.
    pub fn push(&self) -> Result<CommitId> {
        for file in &self.ctx.config.tracked {
            copy_into(file, &file.local_path, &file.mirror_path)?;
        }

        if self.ctx.editor.is_running() {
            self.ctx
                .journal("Editor is running, leaving the extension manifest untouched");
        } else if let Err(e) = self.write_manifest() {
            warn!("Could not refresh extension manifest: {}", e);
        }

        let repo = self.ctx.repo;
        let message = format!(
            "Settings sync {}",
            self.ctx.clock.now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        repo.stage_all()?;
        repo.commit(&message)?;
        repo.push()?;

        let head = repo.head()?;
        self.ctx.store.acknowledge(&head)?;
        self.ctx.journal(&format!("Pushed {}", head.short()));
        Ok(head)
    }

    /// Pulls the remote, resolves any conflict in favour of the local side and
    /// copies the result back to the editor's files. A local file with edits
    /// that were never pushed keeps its content.
    pub fn pull(&self) -> Result<PullOutcome> {
        let repo = self.ctx.repo;
        let unpushed = self.unpushed_edits()?;
        let pulled = repo.fetch().and_then(|_| repo.pull());
        let resolution = ConflictResolver::new(self.ctx).resolve()?;

        if let Err(e) = pulled {
            if !resolution.is_resolved() {
                self.ctx.journal(&format!("Pull failed: {}", e));
                return Err(e);
            }
            debug!("Pull reported {}, conflicts were auto-resolved", e);
        }

        for file in &self.ctx.config.tracked {
            if unpushed.contains(&file.name) {
                self.ctx.journal(&format!(
                    "{}: unpushed local edit, keeping the local copy",
                    file.name
                ));
                continue;
            }
            copy_into(file, &file.mirror_path, &file.local_path)?;
        }

        let head = repo.head()?;
        self.ctx.store.acknowledge(&head)?;
        self.ctx.journal(&format!("Pulled {}", head.short()));

        let extensions = match self.sync_extensions() {
            Ok(sync) => sync,
            Err(e) => {
                warn!("Extension sync failed: {}", e);
                ExtensionSync::default()
            }
        };

        Ok(PullOutcome {
            head,
            resolution,
            extensions,
        })
    }

    /// Names of copied (not linked) files whose local content differs
    /// significantly from the mirror's HEAD.
    fn unpushed_edits(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for file in &self.ctx.config.tracked {
            if file.is_linked() {
                continue;
            }
            let Some(local) = read_optional(&file.local_path)? else {
                continue;
            };
            let committed = committed_copy(self.ctx.repo, file)?.unwrap_or_default();
            if compare(file, &local, &committed) == FileStatus::Significant {
                names.insert(file.name.clone());
            }
        }
        Ok(names)
    }

    /// Installs every manifest entry the editor does not report as
    /// installed. Nothing is read while the editor is running.
    pub fn sync_extensions(&self) -> Result<ExtensionSync> {
        let editor = self.ctx.editor;
        if editor.is_running() {
            self.ctx
                .journal("Editor is running, skipping extension sync");
            return Ok(ExtensionSync {
                skipped: true,
                ..Default::default()
            });
        }

        let wanted = self.read_manifest()?;
        let installed: HashSet<String> = editor
            .installed_extensions()?
            .into_iter()
            .map(|id| id.to_lowercase())
            .collect();

        let mut sync = ExtensionSync::default();
        for id in wanted {
            if installed.contains(&id.to_lowercase()) {
                continue;
            }
            match editor.install_extension(&id) {
                Ok(()) => {
                    self.ctx.journal(&format!("Installed extension {}", id));
                    sync.installed.push(id);
                }
                Err(e) => {
                    self.ctx
                        .journal(&format!("Failed to install extension {}: {}", id, e));
                    sync.failed.push(id);
                }
            }
        }

        Ok(sync)
    }

    pub fn read_manifest(&self) -> Result<Vec<String>> {
        Ok(read_optional(&self.ctx.config.manifest_path)?
            .map(|text| parse_manifest(&text))
            .unwrap_or_default())
    }

    fn write_manifest(&self) -> Result<()> {
        let mut ids = self.ctx.editor.installed_extensions()?;
        ids.sort_by_key(|id| id.to_lowercase());
        ids.dedup();

        let mut text = ids.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(&self.ctx.config.manifest_path, text)?;
        debug!("Wrote {} extension ids to manifest", ids.len());
        Ok(())
    }
}

pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Copies `from` to `to` unless the source is missing or both paths are the
/// same file (a symlinked install).
fn copy_into(file: &TrackedFile, from: &Path, to: &Path) -> Result<()> {
    if !from.exists() || file.is_linked() {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to)?;
    Ok(())
}

use crate::config::STATE_DIR_NAME;
use crate::context::SyncContext;
use crate::error::Result;
use crate::ports::ConflictSide;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const AUTO_RESOLVE_MESSAGE: &str = "Auto-resolved merge conflict by keeping local version";

const BACKUP_MARKERS: [&str; 4] = ["_BACKUP_", "_BASE_", "_LOCAL_", "_REMOTE_"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Clean,
    Resolved {
        files: Vec<PathBuf>,
        /// Where the discarded remote content was archived, if anything was.
        archive: Option<PathBuf>,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Resolves two-sided merge conflicts in favour of the local copy, archiving
/// the remote side first.
pub struct ConflictResolver<'a> {
    ctx: SyncContext<'a>,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(ctx: SyncContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn resolve(&self) -> Result<Resolution> {
        let repo = self.ctx.repo;
        let files = repo.conflicted_files()?;
        if files.is_empty() {
            return Ok(Resolution::Clean);
        }

        let names = files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.ctx.prompt.notify(
            "Merge conflict",
            &format!(
                "{} changed both locally and remotely. This would normally need manual \
                 resolution; keeping the local version and archiving the remote one.",
                names
            ),
        );
        self.ctx
            .journal(&format!("Merge conflict in {}, keeping local version", names));

        let archive_dir = self
            .ctx
            .config
            .conflicts_dir()
            .join(self.ctx.clock.now().format("%Y%m%d-%H%M%S").to_string());
        let mut archived = self.archive_backups(&archive_dir);
        for file in &files {
            match self.archive_remote_side(file, &archive_dir) {
                Ok(true) => archived += 1,
                Ok(false) => {}
                Err(e) => warn!("Could not archive remote side of {}: {}", file.display(), e),
            }
        }

        for file in &files {
            repo.checkout_ours(file)?;
        }
        repo.stage_all()?;
        repo.commit(AUTO_RESOLVE_MESSAGE)?;

        let archive = (archived > 0).then_some(archive_dir);
        if let Some(dir) = &archive {
            self.ctx
                .journal(&format!("Archived remote conflict content in {}", dir.display()));
        }

        Ok(Resolution::Resolved { files, archive })
    }

    /// Moves merge backup artifacts out of the work tree. Best-effort.
    fn archive_backups(&self, archive_dir: &Path) -> usize {
        let mirror = &self.ctx.config.mirror_dir;
        let mut moved = 0;

        let walker = WalkDir::new(mirror).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            name != ".git" && name != STATE_DIR_NAME
        });

        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() || !is_backup_artifact(entry.path()) {
                continue;
            }
            let relative = entry.path().strip_prefix(mirror).unwrap_or(entry.path());
            let target = archive_dir.join(relative);

            let result = target
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|_| std::fs::copy(entry.path(), &target))
                .and_then(|_| std::fs::remove_file(entry.path()));
            match result {
                Ok(()) => {
                    debug!("Archived {:?}", relative);
                    moved += 1;
                }
                Err(e) => warn!("Could not archive {:?}: {}", entry.path(), e),
            }
        }

        moved
    }

    fn archive_remote_side(&self, file: &Path, archive_dir: &Path) -> Result<bool> {
        let Some(theirs) = self.ctx.repo.show_stage(file, ConflictSide::Theirs)? else {
            return Ok(false);
        };
        let mut name = file.as_os_str().to_owned();
        name.push(".remote");
        let target = archive_dir.join(name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, theirs)?;
        Ok(true)
    }
}

/// Files left behind by merge tools: `*.orig` and `name_BACKUP_1234.ext`
/// style copies.
pub fn is_backup_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    name.ends_with(".orig") || BACKUP_MARKERS.iter().any(|marker| name.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::Harness;
    use crate::ports::RepositoryBackend;

    const LOCAL: &str = "{\n  \"editor.fontSize\": 16\n}\n";
    const REMOTE: &str = "{\n  \"editor.fontSize\": 12\n}\n";

    fn conflicted() -> Harness {
        let h = Harness::new();
        h.repo.set_file("c0", "settings.json", LOCAL);
        {
            let mut state = h.repo.state.borrow_mut();
            state.conflicts = vec![PathBuf::from("settings.json")];
            state
                .theirs
                .insert(PathBuf::from("settings.json"), REMOTE.to_string());
        }
        h.write_mirror_uncommitted(
            0,
            "{\n<<<<<<< HEAD\n  \"editor.fontSize\": 16\n=======\n  \"editor.fontSize\": 12\n>>>>>>> origin/master\n}\n",
        );
        h
    }

    #[test]
    fn test_is_backup_artifact() {
        assert!(is_backup_artifact(Path::new("settings.json.orig")));
        assert!(is_backup_artifact(Path::new("settings_BACKUP_4242.json")));
        assert!(is_backup_artifact(Path::new("dir/settings_REMOTE_4242.json")));
        assert!(!is_backup_artifact(Path::new("settings.json")));
        assert!(!is_backup_artifact(Path::new("original.json")));
    }

    #[test]
    fn test_no_conflict_is_noop() {
        let h = Harness::new();

        let resolution = ConflictResolver::new(h.ctx()).resolve().unwrap();

        assert_eq!(resolution, Resolution::Clean);
        assert!(h.repo.calls().is_empty());
        assert!(h.prompt.notifications.borrow().is_empty());
    }

    #[test]
    fn test_local_version_wins() {
        let h = conflicted();

        let resolution = ConflictResolver::new(h.ctx()).resolve().unwrap();

        assert!(resolution.is_resolved());
        similar_asserts::assert_eq!(h.read_mirror(0), LOCAL);
        assert!(!h.read_mirror(0).contains("<<<<<<<"));
        assert!(h.repo.conflicted_files().unwrap().is_empty());
        assert_eq!(
            h.repo.state.borrow().commits,
            vec![AUTO_RESOLVE_MESSAGE.to_string()]
        );
        assert_eq!(h.prompt.notifications.borrow().len(), 1);
        assert_eq!(h.prompt.notifications.borrow()[0].0, "Merge conflict");
    }

    #[test]
    fn test_remote_side_and_backups_archived() {
        let h = conflicted();
        let backup = h.config.mirror_dir.join("settings_BACKUP_77.json");
        std::fs::write(&backup, REMOTE).unwrap();

        let resolution = ConflictResolver::new(h.ctx()).resolve().unwrap();

        let Resolution::Resolved { files, archive } = resolution else {
            panic!("expected a resolution");
        };
        assert_eq!(files, vec![PathBuf::from("settings.json")]);
        let archive = archive.unwrap();
        assert!(archive.starts_with(h.config.conflicts_dir()));
        assert_eq!(
            std::fs::read_to_string(archive.join("settings.json.remote")).unwrap(),
            REMOTE
        );
        assert!(archive.join("settings_BACKUP_77.json").exists());
        assert!(!backup.exists());
    }

    #[test]
    fn test_missing_artifacts_are_not_an_error() {
        let h = conflicted();
        h.repo.state.borrow_mut().theirs.clear();

        let resolution = ConflictResolver::new(h.ctx()).resolve().unwrap();

        assert_eq!(
            resolution,
            Resolution::Resolved {
                files: vec![PathBuf::from("settings.json")],
                archive: None,
            }
        );
        assert!(!h.config.conflicts_dir().exists());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for _ in 0..3 {
            let h = conflicted();
            ConflictResolver::new(h.ctx()).resolve().unwrap();
            assert_eq!(h.read_mirror(0), LOCAL);
        }
    }
}

//! First-time setup: clone the mirror, link the editor's files into it and
//! seed the acknowledged hash.

use crate::daemon::Backends;
use crate::git::GitCli;
use cfgsync_core::config::STATE_DIR_NAME;
use cfgsync_core::ports::ConfirmationBackend;
use cfgsync_core::reconcile::{ExtensionSync, Reconciler};
use cfgsync_core::{CommitId, Config, Error, Result, SyncContext, TrackedFile};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub cloned: bool,
    /// Files copied from the editor into a mirror that lacked them.
    pub seeded: Vec<String>,
    pub backups: Vec<PathBuf>,
    pub linked: Vec<PathBuf>,
    pub acknowledged: Option<CommitId>,
    pub extensions: Option<ExtensionSync>,
}

pub struct Installer {
    config: Config,
}

impl Installer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn install(
        self,
        url: &str,
        prompt: Arc<dyn ConfirmationBackend + Send + Sync>,
    ) -> Result<InstallReport> {
        let mut report = InstallReport {
            cloned: self.prepare_mirror(url)?,
            ..Default::default()
        };
        self.exclude_state_dir()?;

        let now = Utc::now();
        for file in &self.config.tracked {
            self.link_file(file, now, &mut report)?;
        }

        let backends = Backends::new(self.config, prompt)?;
        let ctx = backends.context();
        report.acknowledged = seed_acknowledged(ctx);
        report.extensions = match Reconciler::new(ctx).sync_extensions() {
            Ok(sync) => Some(sync),
            Err(e) => {
                warn!("Extension sync failed: {}", e);
                None
            }
        };

        ctx.journal(&format!(
            "Installed mirror at {}",
            ctx.config.mirror_dir.display()
        ));
        Ok(report)
    }

    /// Clones the remote unless the mirror already holds a checkout. Returns
    /// whether a clone happened.
    pub fn prepare_mirror(&self, url: &str) -> Result<bool> {
        let mirror = &self.config.mirror_dir;
        if mirror.join(".git").exists() {
            info!("Reusing existing clone at {:?}", mirror);
            return Ok(false);
        }

        if mirror.exists() && std::fs::read_dir(mirror)?.next().is_some() {
            return Err(Error::Config(format!(
                "{} exists and is not a git repository",
                mirror.display()
            )));
        }
        if let Some(parent) = mirror.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Cloning {} into {:?}", url, mirror);
        GitCli::clone_repo(url, mirror, &self.config.remote)?;
        Ok(true)
    }

    /// Keeps the state directory out of `git status` and commits.
    pub fn exclude_state_dir(&self) -> Result<()> {
        let exclude = self.config.mirror_dir.join(".git").join("info").join("exclude");
        let pattern = format!("{}/", STATE_DIR_NAME);

        let mut text = match std::fs::read_to_string(&exclude) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if text.lines().any(|line| line.trim() == pattern) {
            return Ok(());
        }

        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&pattern);
        text.push('\n');

        if let Some(parent) = exclude.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&exclude, text)?;
        Ok(())
    }

    fn link_file(
        &self,
        file: &TrackedFile,
        now: DateTime<Utc>,
        report: &mut InstallReport,
    ) -> Result<()> {
        if file.is_linked() {
            debug!("{} already linked", file.name);
            return Ok(());
        }

        let local_meta = file.local_path.symlink_metadata().ok();
        let local_is_file = local_meta.as_ref().is_some_and(|m| m.is_file());

        if !file.mirror_path.exists() {
            if !local_is_file {
                debug!("{} exists on neither side, nothing to link", file.name);
                return Ok(());
            }
            if let Some(parent) = file.mirror_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&file.local_path, &file.mirror_path)?;
            report.seeded.push(file.name.clone());
        }

        match local_meta {
            Some(meta) if meta.file_type().is_symlink() => {
                std::fs::remove_file(&file.local_path)?;
            }
            Some(_) => {
                let backup = backup_path(&file.local_path, now);
                std::fs::rename(&file.local_path, &backup)?;
                info!("Backed up {:?} to {:?}", file.local_path, backup);
                report.backups.push(backup);
            }
            None => {
                if let Some(parent) = file.local_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        link(&file.mirror_path, &file.local_path)?;
        report.linked.push(file.local_path.clone());
        Ok(())
    }
}

/// `settings.json` becomes `settings.json.bak-20260314-093000`.
pub fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".bak-{}", now.format("%Y%m%d-%H%M%S")));
    PathBuf::from(name)
}

/// Acknowledges whatever the remote currently holds so the first run does
/// not offer to pull the state that was just cloned.
fn seed_acknowledged(ctx: SyncContext<'_>) -> Option<CommitId> {
    if let Err(e) = ctx.repo.fetch() {
        warn!("Fetch failed during install: {}", e);
    }
    let tip = match ctx.repo.remote_tip(&ctx.config.remote_branches) {
        Ok(tip) => tip,
        Err(e) => {
            warn!("No remote tip to acknowledge: {}", e);
            return None;
        }
    };
    match ctx.store.acknowledge(&tip) {
        Ok(()) => Some(tip),
        Err(e) => {
            warn!("Could not write acknowledged hash: {}", e);
            None
        }
    }
}

#[cfg(unix)]
fn link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::fs::copy(target, link).map(|_| ())
}

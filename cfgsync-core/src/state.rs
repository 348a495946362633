use crate::error::{Error, Result};
use crate::models::CommitId;
use crate::ports::StateStore;
use chrono::{DateTime, Local, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Keeps the acknowledged hash in a single-line marker file and appends
/// timestamped lines to a plain-text log.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    hash_path: PathBuf,
    log_path: PathBuf,
}

impl FileStateStore {
    pub fn new<P: Into<PathBuf>>(hash_path: P, log_path: P) -> Self {
        Self {
            hash_path: hash_path.into(),
            log_path: log_path.into(),
        }
    }

    pub fn hash_path(&self) -> &Path {
        &self.hash_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Last `count` lines of the log, oldest first.
    pub fn tail_log(&self, count: usize) -> Result<Vec<String>> {
        let text = match std::fs::read_to_string(&self.log_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let skip = lines.len().saturating_sub(count);
        Ok(lines.into_iter().skip(skip).collect())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl StateStore for FileStateStore {
    fn acknowledged(&self) -> Result<Option<CommitId>> {
        match std::fs::read_to_string(&self.hash_path) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(CommitId::parse(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn acknowledged_at(&self) -> Result<Option<DateTime<Utc>>> {
        match std::fs::metadata(&self.hash_path) {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn acknowledge(&self, id: &CommitId) -> Result<()> {
        ensure_parent(&self.hash_path)?;
        std::fs::write(&self.hash_path, format!("{}\n", id))?;
        Ok(())
    }

    fn append_log(&self, line: &str) -> Result<()> {
        ensure_parent(&self.log_path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(
            file,
            "[{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            line
        )?;
        Ok(())
    }
}

/// Exclusive advisory lock held for the lifetime of a daemon or one-shot
/// reconciliation. Released when dropped.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::AlreadyRunning(path.to_path_buf()));
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

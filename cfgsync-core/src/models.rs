use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Json,
    Opaque,
}

impl FileKind {
    pub fn as_str(&self) -> &str {
        match self {
            FileKind::Json => "json",
            FileKind::Opaque => "opaque",
        }
    }
}

/// A local editor file paired with its copy inside the mirror repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub name: String,
    pub local_path: PathBuf,
    pub mirror_path: PathBuf,
    /// Path of the mirror copy relative to the repository root.
    pub repo_path: PathBuf,
    pub kind: FileKind,
}

impl TrackedFile {
    pub fn new(name: &str, local_dir: &Path, mirror_dir: &Path, kind: FileKind) -> Self {
        Self {
            name: name.to_string(),
            local_path: local_dir.join(name),
            mirror_path: mirror_dir.join(name),
            repo_path: PathBuf::from(name),
            kind,
        }
    }

    /// True when the local path resolves to the mirror copy, as it does after
    /// `cfgsync install` replaces the editor file with a symlink.
    pub fn is_linked(&self) -> bool {
        match (
            std::fs::canonicalize(&self.local_path),
            std::fs::canonicalize(&self.mirror_path),
        ) {
            (Ok(local), Ok(mirror)) => local == mirror,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(Error::InvalidCommitId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a local file compares to its mirror copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Identical,
    WhitespaceOnly,
    Significant,
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Identical => "identical",
            FileStatus::WhitespaceOnly => "whitespace-only",
            FileStatus::Significant => "significant",
        }
    }
}

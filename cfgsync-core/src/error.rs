use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Could not run git: {0}")]
    GitUnavailable(String),

    #[error("No remote branch found (tried: {})", .0.join(", "))]
    NoRemoteBranch(Vec<String>),

    #[error("Mirror directory {0} is not an initialized git repository; run 'cfgsync install' first")]
    MirrorNotInitialized(PathBuf),

    #[error("Another cfgsync instance holds the lock at {0}")]
    AlreadyRunning(PathBuf),

    #[error("Editor command failed: {0}")]
    Editor(String),

    #[error("Invalid commit id: {0:?}")]
    InvalidCommitId(String),
}

impl Error {
    /// Failures the scheduler absorbs and retries on the next iteration.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Git(_) | Error::NoRemoteBranch(_) | Error::Editor(_)
        )
    }
}

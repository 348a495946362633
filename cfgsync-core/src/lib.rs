//! # cfgsync-core
//!
//! Core library for cfgsync - drift detection and reconciliation between an
//! editor's settings files and their mirror in a git repository.
//!
//! Every component takes a [`SyncContext`] holding the resolved [`Config`] and
//! the collaborator ports (git, operator prompt, editor, persisted state,
//! clock), so the logic runs unchanged against real backends or test fakes.

pub mod config;
pub mod conflict;
pub mod context;
pub mod diff;
pub mod error;
pub mod local;
pub mod models;
pub mod normalize;
pub mod ports;
pub mod reconcile;
pub mod remote;
pub mod scheduler;
pub mod state;

#[cfg(test)]
mod fakes;

pub use config::{ClassificationStrategy, Config, ConfigFile, PreviewMode};
pub use context::SyncContext;
pub use error::{Error, Result};
pub use models::{CommitId, FileKind, FileStatus, TrackedFile};
pub use scheduler::{IterationReport, Scheduler};
pub use state::{FileStateStore, InstanceLock};

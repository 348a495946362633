//! # cfgsync-daemon
//!
//! Concrete collaborators for cfgsync (the git and editor command lines), the
//! long-running polling service, and first-time installation.

pub mod daemon;
pub mod editor;
pub mod git;
pub mod install;
pub mod service;

pub use daemon::{Backends, SyncDaemon};
pub use editor::EditorCli;
pub use git::GitCli;
pub use install::{InstallReport, Installer};
pub use service::{register_service, ServiceKind};

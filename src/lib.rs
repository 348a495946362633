//! # cfgsync
//!
//! Mirrors an editor's settings, keybindings and extension list against a
//! git remote, detects drift in either direction and reconciles it after
//! asking the operator.
//!
//! The `cfgsync` binary lives in the `cfgsync-cli` crate; this crate
//! re-exports the library pieces.

pub use cfgsync_core as core;
pub use cfgsync_daemon as daemon;

use crate::config::Config;
use crate::ports::{Clock, ConfirmationBackend, EditorBackend, RepositoryBackend, StateStore};
use tracing::{info, warn};

/// Everything a component needs, borrowed for one scheduler iteration or one
/// CLI command.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub config: &'a Config,
    pub repo: &'a dyn RepositoryBackend,
    pub store: &'a dyn StateStore,
    pub prompt: &'a dyn ConfirmationBackend,
    pub editor: &'a dyn EditorBackend,
    pub clock: &'a dyn Clock,
}

impl<'a> SyncContext<'a> {
    /// Records an event in the sync log and the tracing output.
    pub fn journal(&self, message: &str) {
        info!("{}", message);
        if let Err(e) = self.store.append_log(message) {
            warn!("Failed to append to sync log: {}", e);
        }
    }
}

use crate::editor::EditorCli;
use crate::git::GitCli;
use cfgsync_core::ports::{ConfirmationBackend, SystemClock};
use cfgsync_core::{
    Config, FileStateStore, InstanceLock, IterationReport, Result, Scheduler, SyncContext,
};
use std::sync::Arc;
use tracing::{debug, info};

/// The concrete collaborators for one mirror.
pub struct Backends {
    pub config: Config,
    pub repo: GitCli,
    pub editor: EditorCli,
    pub store: FileStateStore,
    pub clock: SystemClock,
    pub prompt: Arc<dyn ConfirmationBackend + Send + Sync>,
}

impl Backends {
    /// Fails with `MirrorNotInitialized` unless the mirror is a git checkout.
    pub fn new(config: Config, prompt: Arc<dyn ConfirmationBackend + Send + Sync>) -> Result<Self> {
        config.ensure_initialized()?;

        Ok(Self {
            repo: GitCli::new(&config.mirror_dir, &config.remote),
            editor: EditorCli::new(&config.editor),
            store: FileStateStore::new(config.hash_marker_path(), config.log_path()),
            clock: SystemClock,
            prompt,
            config,
        })
    }

    pub fn context(&self) -> SyncContext<'_> {
        SyncContext {
            config: &self.config,
            repo: &self.repo,
            store: &self.store,
            prompt: self.prompt.as_ref(),
            editor: &self.editor,
            clock: &self.clock,
        }
    }
}

/// Holds the instance lock for as long as it lives.
pub struct SyncDaemon {
    backends: Arc<Backends>,
    lock: InstanceLock,
}

impl SyncDaemon {
    pub fn open(config: Config, prompt: Arc<dyn ConfirmationBackend + Send + Sync>) -> Result<Self> {
        let backends = Backends::new(config, prompt)?;
        let lock = InstanceLock::acquire(&backends.config.lock_path())?;
        debug!("Acquired {:?}", lock.path());

        Ok(Self {
            backends: Arc::new(backends),
            lock,
        })
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn context(&self) -> SyncContext<'_> {
        self.backends.context()
    }

    pub fn run_once(&self, scheduler: &mut Scheduler) -> IterationReport {
        scheduler.run_iteration(self.context())
    }

    /// Runs iterations until Ctrl-C, sleeping `poll_interval` between them.
    pub async fn serve(self, skip_first_remote_check: bool) -> anyhow::Result<()> {
        let interval = self.backends.config.poll_interval;
        let mut scheduler = Scheduler::new(skip_first_remote_check);

        info!("Mirroring into {:?}", self.backends.config.mirror_dir);
        info!("Polling every {}s", interval.as_secs());
        info!("Lock file: {:?}", self.lock.path());

        loop {
            let backends = Arc::clone(&self.backends);
            let (returned, report) = tokio::task::spawn_blocking(move || {
                let report = scheduler.run_iteration(backends.context());
                (scheduler, report)
            })
            .await?;
            scheduler = returned;
            debug!("Iteration {} finished: {:?}", scheduler.iterations(), report);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping after {} iterations", scheduler.iterations());
                    break;
                }
            }
        }

        Ok(())
    }
}

//! In-memory stand-ins for the ports, shared by the unit tests.

use crate::config::{Config, ConfigFile};
use crate::context::SyncContext;
use crate::error::{Error, Result};
use crate::models::CommitId;
use crate::ports::{
    Clock, ConfirmationBackend, ConflictSide, EditorBackend, MergeStatus, Prompt,
    RepositoryBackend, StateStore,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn commit(id: &str) -> CommitId {
    CommitId::parse(id).unwrap()
}

#[derive(Debug)]
pub struct RepoState {
    pub head: CommitId,
    pub remote_tip: Option<CommitId>,
    pub merge_base: Option<CommitId>,
    /// File contents keyed by (revision, repo path).
    pub files: HashMap<(String, PathBuf), String>,
    pub branch: String,
    pub branches: Vec<String>,
    pub merge_status: MergeStatus,
    pub fail_merge: bool,
    pub staged_diffs: HashMap<PathBuf, String>,
    pub conflicts: Vec<PathBuf>,
    pub theirs: HashMap<PathBuf, String>,
    pub fail_fetch: bool,
    pub fail_commit: bool,
    pub fail_push: bool,
    pub fail_pull: bool,
    /// Conflicts a pull leaves behind; the pull then reports failure.
    pub pull_conflicts: Vec<PathBuf>,
    pub head_after_pull: Option<CommitId>,
    /// Written into the work tree on pull, keyed by repo path.
    pub pulled_files: HashMap<PathBuf, String>,
    pub commits: Vec<String>,
    pub calls: Vec<String>,
}

pub struct FakeRepo {
    pub workdir: PathBuf,
    pub state: RefCell<RepoState>,
}

impl FakeRepo {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            state: RefCell::new(RepoState {
                head: commit("c0"),
                remote_tip: Some(commit("c0")),
                merge_base: None,
                files: HashMap::new(),
                branch: "master".to_string(),
                branches: vec!["master".to_string()],
                merge_status: MergeStatus::Clean,
                fail_merge: false,
                staged_diffs: HashMap::new(),
                conflicts: Vec::new(),
                theirs: HashMap::new(),
                fail_fetch: false,
                fail_commit: false,
                fail_push: false,
                fail_pull: false,
                pull_conflicts: Vec::new(),
                head_after_pull: None,
                pulled_files: HashMap::new(),
                commits: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn set_file(&self, rev: &str, path: &str, content: &str) {
        self.state
            .borrow_mut()
            .files
            .insert((rev.to_string(), PathBuf::from(path)), content.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.state.borrow().calls.iter().any(|c| c.starts_with(name))
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl RepositoryBackend for FakeRepo {
    fn head(&self) -> Result<CommitId> {
        Ok(self.state.borrow().head.clone())
    }

    fn remote_tip(&self, branches: &[String]) -> Result<CommitId> {
        self.state
            .borrow()
            .remote_tip
            .clone()
            .ok_or_else(|| Error::NoRemoteBranch(branches.to_vec()))
    }

    fn fetch(&self) -> Result<()> {
        self.record("fetch".to_string());
        if self.state.borrow().fail_fetch {
            return Err(Error::Git("could not resolve host".to_string()));
        }
        Ok(())
    }

    fn merge_base(&self, _a: &CommitId, _b: &CommitId) -> Result<Option<CommitId>> {
        Ok(self.state.borrow().merge_base.clone())
    }

    fn show_file(&self, rev: &CommitId, path: &Path) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .files
            .get(&(rev.as_str().to_string(), path.to_path_buf()))
            .cloned())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.state.borrow().branch.clone())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("create_branch {}", name));
        let mut state = self.state.borrow_mut();
        state.branches.push(name.to_string());
        state.branch = name.to_string();
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.record(format!("checkout {}", name));
        self.state.borrow_mut().branch = name.to_string();
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.record(format!("delete_branch {}", name));
        self.state.borrow_mut().branches.retain(|b| b != name);
        Ok(())
    }

    fn merge_no_commit(&self, rev: &CommitId) -> Result<MergeStatus> {
        self.record(format!("merge_no_commit {}", rev));
        let state = self.state.borrow();
        if state.fail_merge {
            return Err(Error::Git("merge failed".to_string()));
        }
        Ok(state.merge_status)
    }

    fn abort_merge(&self) -> Result<()> {
        self.record("abort_merge".to_string());
        Ok(())
    }

    fn staged_diff_ignoring_whitespace(&self, path: &Path) -> Result<String> {
        Ok(self
            .state
            .borrow()
            .staged_diffs
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage_all".to_string());
        self.state.borrow_mut().conflicts.clear();
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        let mut state = self.state.borrow_mut();
        if state.fail_commit {
            return Err(Error::Git("nothing to commit, working tree clean".to_string()));
        }
        state.commits.push(message.to_string());
        state.head = commit(&format!("local{}", state.commits.len()));
        Ok(())
    }

    fn push(&self) -> Result<()> {
        self.record("push".to_string());
        if self.state.borrow().fail_push {
            return Err(Error::Git("failed to push some refs".to_string()));
        }
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.record("pull".to_string());
        let mut state = self.state.borrow_mut();
        if state.fail_pull {
            return Err(Error::Git("could not read from remote repository".to_string()));
        }
        for (path, content) in &state.pulled_files {
            std::fs::write(self.workdir.join(path), content)?;
        }
        if let Some(head) = state.head_after_pull.clone() {
            state.head = head;
        }
        if !state.pull_conflicts.is_empty() {
            state.conflicts = state.pull_conflicts.clone();
            return Err(Error::Git("Automatic merge failed; fix conflicts".to_string()));
        }
        Ok(())
    }

    fn conflicted_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self.state.borrow().conflicts.clone())
    }

    fn checkout_ours(&self, path: &Path) -> Result<()> {
        self.record(format!("checkout_ours {}", path.display()));
        let state = self.state.borrow();
        let ours = state
            .files
            .get(&(state.head.as_str().to_string(), path.to_path_buf()))
            .cloned()
            .unwrap_or_default();
        std::fs::write(self.workdir.join(path), ours)?;
        Ok(())
    }

    fn show_stage(&self, path: &Path, side: ConflictSide) -> Result<Option<String>> {
        match side {
            ConflictSide::Theirs => Ok(self.state.borrow().theirs.get(path).cloned()),
            ConflictSide::Ours => {
                let state = self.state.borrow();
                Ok(state
                    .files
                    .get(&(state.head.as_str().to_string(), path.to_path_buf()))
                    .cloned())
            }
        }
    }
}

pub struct FakeStore {
    pub now: DateTime<Utc>,
    pub acknowledged: RefCell<Option<CommitId>>,
    pub acknowledged_at: Cell<Option<DateTime<Utc>>>,
    pub log: RefCell<Vec<String>>,
}

impl FakeStore {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            acknowledged: RefCell::new(None),
            acknowledged_at: Cell::new(None),
            log: RefCell::new(Vec::new()),
        }
    }

    /// Marks `id` as acknowledged long enough ago to be outside any debounce.
    pub fn seed(&self, id: &str) {
        *self.acknowledged.borrow_mut() = Some(commit(id));
        self.acknowledged_at.set(Some(self.now - Duration::hours(1)));
    }

    pub fn current(&self) -> Option<CommitId> {
        self.acknowledged.borrow().clone()
    }

    pub fn logged(&self, needle: &str) -> bool {
        self.log.borrow().iter().any(|line| line.contains(needle))
    }
}

impl StateStore for FakeStore {
    fn acknowledged(&self) -> Result<Option<CommitId>> {
        Ok(self.acknowledged.borrow().clone())
    }

    fn acknowledged_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.acknowledged_at.get())
    }

    fn acknowledge(&self, id: &CommitId) -> Result<()> {
        *self.acknowledged.borrow_mut() = Some(id.clone());
        self.acknowledged_at.set(Some(self.now));
        Ok(())
    }

    fn append_log(&self, line: &str) -> Result<()> {
        self.log.borrow_mut().push(line.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePrompt {
    pub answers: RefCell<VecDeque<bool>>,
    pub prompts: RefCell<Vec<Prompt>>,
    pub notifications: RefCell<Vec<(String, String)>>,
}

impl FakePrompt {
    pub fn answer(&self, yes: bool) {
        self.answers.borrow_mut().push_back(yes);
    }

    pub fn titles(&self) -> Vec<String> {
        self.prompts.borrow().iter().map(|p| p.title.clone()).collect()
    }
}

impl ConfirmationBackend for FakePrompt {
    fn notify(&self, title: &str, body: &str) {
        self.notifications
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
    }

    fn confirm(&self, prompt: &Prompt) -> bool {
        self.prompts.borrow_mut().push(prompt.clone());
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}

#[derive(Default)]
pub struct FakeEditor {
    pub running: Cell<bool>,
    pub installed: RefCell<Vec<String>>,
    pub broken: Vec<String>,
    pub install_calls: RefCell<Vec<String>>,
    pub list_calls: Cell<usize>,
}

impl EditorBackend for FakeEditor {
    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn installed_extensions(&self) -> Result<Vec<String>> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.installed.borrow().clone())
    }

    fn install_extension(&self, id: &str) -> Result<()> {
        self.install_calls.borrow_mut().push(id.to_string());
        if self.broken.iter().any(|b| b == id) {
            return Err(Error::Editor(format!("extension '{}' not found", id)));
        }
        self.installed.borrow_mut().push(id.to_string());
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Temporary local/mirror directories plus one fake per port.
pub struct Harness {
    _dir: TempDir,
    pub config: Config,
    pub repo: FakeRepo,
    pub store: FakeStore,
    pub prompt: FakePrompt,
    pub editor: FakeEditor,
    pub clock: FixedClock,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("local");
        let mirror = dir.path().join("mirror");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::create_dir_all(mirror.join(".git")).unwrap();

        let file = ConfigFile {
            mirror_dir: Some(mirror.clone()),
            editor_user_dir: Some(local),
            ..Default::default()
        };
        let config = Config::resolve_with(file, dir.path(), dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();

        Self {
            repo: FakeRepo::new(&mirror),
            store: FakeStore::new(now),
            prompt: FakePrompt::default(),
            editor: FakeEditor::default(),
            clock: FixedClock(now),
            config,
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> SyncContext<'_> {
        SyncContext {
            config: &self.config,
            repo: &self.repo,
            store: &self.store,
            prompt: &self.prompt,
            editor: &self.editor,
            clock: &self.clock,
        }
    }

    pub fn write_local(&self, index: usize, content: &str) {
        std::fs::write(&self.config.tracked[index].local_path, content).unwrap();
    }

    /// Writes the mirror copy and records it as the file's content at HEAD.
    pub fn write_mirror(&self, index: usize, content: &str) {
        self.write_mirror_uncommitted(index, content);
        let head = self.repo.state.borrow().head.clone();
        let repo_path = self.config.tracked[index].repo_path.to_string_lossy().into_owned();
        self.repo.set_file(head.as_str(), &repo_path, content);
    }

    /// Changes only the mirror's work tree.
    pub fn write_mirror_uncommitted(&self, index: usize, content: &str) {
        std::fs::write(&self.config.tracked[index].mirror_path, content).unwrap();
    }

    pub fn read_mirror(&self, index: usize) -> String {
        std::fs::read_to_string(&self.config.tracked[index].mirror_path).unwrap()
    }

    pub fn read_local(&self, index: usize) -> String {
        std::fs::read_to_string(&self.config.tracked[index].local_path).unwrap()
    }
}

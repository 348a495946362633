//! [`RepositoryBackend`] backed by the `git` command line.

use cfgsync_core::error::{Error, Result};
use cfgsync_core::ports::{ConflictSide, MergeStatus, RepositoryBackend};
use cfgsync_core::CommitId;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            remote: remote.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Clones `url` into `target`, naming the remote `remote`.
    pub fn clone_repo(url: &str, target: &Path, remote: &str) -> Result<Self> {
        let output = Command::new("git")
            .args(["clone", "--origin", remote, url])
            .arg(target)
            .output()
            .map_err(|e| Error::GitUnavailable(e.to_string()))?;
        check("clone", output)?;
        Ok(Self::new(target, remote))
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| Error::GitUnavailable(e.to_string()))
    }

    /// Runs git and returns stdout, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        check(args.first().copied().unwrap_or("git"), output)
    }

    /// Runs git and returns stdout, or `None` on a non-zero exit.
    fn try_run(&self, args: &[&str]) -> Result<Option<String>> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            Ok(None)
        }
    }
}

fn check(command: &str, output: Output) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    Err(Error::Git(format!("git {}: {}", command, detail)))
}

/// Git wants forward slashes in `rev:path` specs on every platform.
fn spec_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Paths `git status --porcelain` reports as modified or added on both sides.
pub fn parse_conflicts(porcelain: &str) -> Vec<PathBuf> {
    porcelain
        .lines()
        .filter(|line| line.len() > 3)
        .filter(|line| matches!(&line[..2], "UU" | "AA"))
        .map(|line| PathBuf::from(line[3..].trim_matches('"')))
        .collect()
}

impl RepositoryBackend for GitCli {
    fn head(&self) -> Result<CommitId> {
        CommitId::parse(&self.run(&["rev-parse", "HEAD"])?)
    }

    fn remote_tip(&self, branches: &[String]) -> Result<CommitId> {
        for branch in branches {
            let reference = format!("refs/remotes/{}/{}", self.remote, branch);
            if let Some(id) = self.try_run(&["rev-parse", "--verify", "--quiet", &reference])? {
                return CommitId::parse(&id);
            }
        }
        Err(Error::NoRemoteBranch(
            branches
                .iter()
                .map(|b| format!("{}/{}", self.remote, b))
                .collect(),
        ))
    }

    fn fetch(&self) -> Result<()> {
        self.run(&["fetch", &self.remote])?;
        Ok(())
    }

    fn merge_base(&self, a: &CommitId, b: &CommitId) -> Result<Option<CommitId>> {
        match self.try_run(&["merge-base", a.as_str(), b.as_str()])? {
            Some(id) => Ok(Some(CommitId::parse(&id)?)),
            None => Ok(None),
        }
    }

    fn show_file(&self, rev: &CommitId, path: &Path) -> Result<Option<String>> {
        let spec = format!("{}:{}", rev, spec_path(path));
        self.try_run(&["show", &spec])
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self
            .run(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-b", name])?;
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.run(&["checkout", name])?;
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-D", name])?;
        Ok(())
    }

    fn merge_no_commit(&self, rev: &CommitId) -> Result<MergeStatus> {
        let output = self.output(&["merge", "--no-commit", "--no-ff", rev.as_str()])?;
        if output.status.success() {
            return Ok(MergeStatus::Clean);
        }
        if !self.conflicted_files()?.is_empty() {
            return Ok(MergeStatus::Conflicted);
        }
        check("merge", output).map(|_| MergeStatus::Clean)
    }

    fn abort_merge(&self) -> Result<()> {
        self.run(&["merge", "--abort"])?;
        Ok(())
    }

    fn staged_diff_ignoring_whitespace(&self, path: &Path) -> Result<String> {
        let path = spec_path(path);
        self.run(&[
            "diff",
            "--cached",
            "--ignore-all-space",
            "--ignore-blank-lines",
            "--",
            &path,
        ])
    }

    fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message])?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        self.run(&["push", &self.remote, "HEAD"])?;
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.run(&["pull", "--no-rebase", "--no-edit", &self.remote])?;
        Ok(())
    }

    fn conflicted_files(&self) -> Result<Vec<PathBuf>> {
        Ok(parse_conflicts(&self.run(&["status", "--porcelain"])?))
    }

    fn checkout_ours(&self, path: &Path) -> Result<()> {
        let path = spec_path(path);
        self.run(&["checkout", "--ours", "--", &path])?;
        Ok(())
    }

    fn show_stage(&self, path: &Path, side: ConflictSide) -> Result<Option<String>> {
        let stage = match side {
            ConflictSide::Ours => 2,
            ConflictSide::Theirs => 3,
        };
        let spec = format!(":{}:{}", stage, spec_path(path));
        self.try_run(&["show", &spec])
    }
}

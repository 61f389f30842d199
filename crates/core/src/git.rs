//! Local Git repository access via `git2`.
//!
//! [`GitRepo`] covers repository discovery, config reads/writes for the
//! remote registry, the commit-graph queries the protocols need, and the Git
//! side of the fast-export/fast-import pipeline. The repository root is held
//! explicitly and passed to every external command — the process working
//! directory is never changed.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Sort};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::GitError;
use crate::vcs::{ExportOpts, ImportOpts, StreamExport, StreamImport};

/// Handle on the enclosing local Git repository.
pub struct GitRepo {
    repo: Repository,
    git_dir: PathBuf,
    workdir: PathBuf,
}

/// One line of a commit-range summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    pub author: String,
    pub summary: String,
}

impl GitRepo {
    /// Discover the repository enclosing `start`.
    pub fn discover<P: AsRef<Path>>(start: P) -> Result<Self, GitError> {
        let repo = Repository::discover(start.as_ref()).map_err(|_| GitError::NotARepository)?;
        Self::from_repository(repo)
    }

    /// Open the repository at `path` directly.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let repo = Repository::open(path.as_ref()).map_err(|_| GitError::NotARepository)?;
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self, GitError> {
        let git_dir = repo.path().to_path_buf();
        // The bridge needs a working tree to anchor fast-export/fast-import.
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::NotARepository)?;
        info!(git_dir = %git_dir.display(), "opened git repository");
        Ok(Self {
            repo,
            git_dir,
            workdir,
        })
    }

    /// The repository's control directory (`.git`).
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The repository's logical root.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// List configured Git remote names.
    pub fn remote_names(&self) -> Result<Vec<String>, GitError> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().map(str::to_string).collect())
    }

    /// Read `key` from the repository configuration.
    pub fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        let mut config = self.repo.config()?;
        let snapshot = config.snapshot()?;
        match snapshot.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `key` into the repository-local configuration.
    pub fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        let mut config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        config.set_str(key, value)?;
        debug!(key, value, "wrote config entry");
        Ok(())
    }

    /// Resolve a revspec to a commit id.
    pub fn resolve(&self, spec: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|_| GitError::UnknownRef(spec.to_string()))?;
        let commit = object
            .peel(git2::ObjectType::Commit)
            .map_err(|_| GitError::UnknownRef(spec.to_string()))?;
        Ok(commit.id())
    }

    /// How many commits `local` is ahead of and behind `upstream`.
    pub fn ahead_behind(&self, local: Oid, upstream: Oid) -> Result<(usize, usize), GitError> {
        Ok(self.repo.graph_ahead_behind(local, upstream)?)
    }

    /// Commits reachable from `new` but not from `old`, oldest first.
    pub fn commits_between(&self, old: Oid, new: Oid) -> Result<Vec<CommitSummary>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(new)?;
        revwalk.hide(old)?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitSummary {
                id: oid.to_string(),
                author: commit.author().name().unwrap_or("").to_string(),
                summary: commit.summary().unwrap_or("").to_string(),
            });
        }
        debug!(count = commits.len(), "collected commit summaries");
        Ok(commits)
    }
}

impl StreamExport for GitRepo {
    fn export_command(&self, opts: &ExportOpts<'_>) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("git");
        cmd.current_dir(&self.workdir).arg("fast-export");
        if let Some(marks) = opts.import_marks {
            cmd.arg(format!("--import-marks={}", marks.display()));
        }
        cmd.arg(format!("--export-marks={}", opts.export_marks.display()));
        cmd.arg(opts.source);
        cmd
    }
}

impl StreamImport for GitRepo {
    fn import_command(&self, opts: &ImportOpts<'_>) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("git");
        cmd.current_dir(&self.workdir).arg("fast-import");
        if opts.quiet {
            cmd.arg("--quiet");
        }
        if let Some(marks) = opts.import_marks {
            cmd.arg(format!("--import-marks={}", marks.display()));
        }
        cmd.arg(format!("--export-marks={}", opts.export_marks.display()));
        cmd
    }
}

//! Error types for the GitBzrSync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Marks(#[from] MarkError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

// ---------------------------------------------------------------------------
// External process errors
// ---------------------------------------------------------------------------

/// Errors from running external commands and export|import pipelines.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable was not found on `$PATH`.
    #[error("{0} binary not found")]
    BinaryNotFound(String),

    /// A command exited with a non-zero status.
    #[error("`{command}` failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Local Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git repository access.
#[derive(Debug, Error)]
pub enum GitError {
    /// No enclosing Git repository could be discovered.
    #[error("Must be inside a git repository to work")]
    NotARepository,

    /// A revspec could not be resolved to a commit.
    #[error("unknown git ref: {0}")]
    UnknownRef(String),

    /// A `git2` library error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

// ---------------------------------------------------------------------------
// Remote registry errors
// ---------------------------------------------------------------------------

/// Errors from remote registration and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already taken, either as a Git remote or as a
    /// registered Bazaar branch.
    #[error("there is already a remote named '{0}'")]
    DuplicateRemote(String),

    /// The location does not carry Bazaar control metadata.
    #[error("'{0}' is not a bazaar repository")]
    InvalidRemoteLocation(String),

    /// No location is recorded under the given name.
    #[error("cannot find bazaar remote with name '{0}'")]
    UnknownRemote(String),

    /// Underlying Git config error.
    #[error("registry git error: {0}")]
    Git(#[from] GitError),
}

// ---------------------------------------------------------------------------
// Mark store errors
// ---------------------------------------------------------------------------

/// Errors from the mark store.
#[derive(Debug, Error)]
pub enum MarkError {
    /// Exactly one of the two mark files exists. Never auto-repaired:
    /// a human must inspect the pair and decide.
    #[error("one of the mark files for '{remote}' is missing; inspect {} before retrying", .dir.display())]
    Inconsistent { remote: String, dir: PathBuf },

    /// The bridge path exists but is not a directory.
    #[error("'{}' exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Generic I/O wrapper.
    #[error("mark store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sync protocol errors
// ---------------------------------------------------------------------------

/// Errors from the fetch and push protocols.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The mirror branch has commits that HEAD does not.
    #[error("HEAD is not a strict descendant of 'bzr/{0}', cannot push. Merge first")]
    NotFastForward(String),

    /// HEAD has nothing beyond the mirror branch.
    #[error("nothing to push. Commit something first")]
    NothingToPush,

    /// The mark pair does not exist yet.
    #[error("no mark files for '{0}' yet; fetch before pushing")]
    MissingRefmap(String),

    /// Mark store error during sync.
    #[error("sync mark error: {0}")]
    Marks(#[from] MarkError),

    /// Git error during sync.
    #[error("sync git error: {0}")]
    Git(#[from] GitError),

    /// External tool failure during sync.
    #[error("sync process error: {0}")]
    Process(#[from] ProcessError),
}

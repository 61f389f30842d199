//! Mark store: the per-remote pair of fast-export/fast-import mark files.
//!
//! The pair records the commit correspondence between the two sides — one
//! file owned by the Git tools, one by the Bazaar tools. The engine never
//! parses their contents; it only tracks their existence and hands their
//! paths through to the export/import pair.
//!
//! The pair is binary: both files exist ([`MarkState::Synced`]) or neither
//! does ([`MarkState::New`]). Exactly one existing is [`MarkState::Corrupt`]
//! and is always surfaced to the caller, never repaired.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::MarkError;

/// Directory under the Git control dir holding all mark files.
pub const BRIDGE_DIR: &str = "bridge";

/// Synchronization state derived from the mark pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    /// Neither file exists: the remote has never been fetched.
    New,
    /// Both files exist: at least one full cycle has completed.
    Synced,
    /// Exactly one file exists.
    Corrupt,
}

/// The mark-file pair for one remote.
#[derive(Debug, Clone)]
pub struct MarkStore {
    remote: String,
    dir: PathBuf,
    local_map: PathBuf,
    foreign_map: PathBuf,
}

impl MarkStore {
    pub fn new(git_dir: &Path, remote: &str) -> Self {
        let dir = git_dir.join(BRIDGE_DIR);
        let local_map = dir.join(format!("{remote}-local-map"));
        let foreign_map = dir.join(format!("{remote}-foreign-map"));
        Self {
            remote: remote.to_string(),
            dir,
            local_map,
            foreign_map,
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Canonical Git-side marks path.
    pub fn local_map(&self) -> &Path {
        &self.local_map
    }

    /// Canonical Bazaar-side marks path.
    pub fn foreign_map(&self) -> &Path {
        &self.foreign_map
    }

    /// Current state, from pure existence checks.
    pub fn state(&self) -> MarkState {
        match (self.local_map.is_file(), self.foreign_map.is_file()) {
            (false, false) => MarkState::New,
            (true, true) => MarkState::Synced,
            _ => MarkState::Corrupt,
        }
    }

    /// The error reported for [`MarkState::Corrupt`].
    pub fn inconsistent(&self) -> MarkError {
        MarkError::Inconsistent {
            remote: self.remote.clone(),
            dir: self.dir.clone(),
        }
    }

    /// Create the bridge directory if needed. Idempotent; fails only when
    /// the path exists and is not a directory.
    pub fn ensure_dir(&self) -> Result<(), MarkError> {
        if self.dir.is_dir() {
            return Ok(());
        }
        if self.dir.exists() {
            return Err(MarkError::NotADirectory(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir)?;
        debug!(dir = %self.dir.display(), "created bridge directory");
        Ok(())
    }

    /// Begin a staged update of the pair.
    ///
    /// The tools export their refreshed marks to pending sibling paths while
    /// importing from the canonical ones; only [`MarkTransaction::commit`]
    /// renames the pending files into place, so an interrupted pipeline
    /// leaves the canonical pair — and hence the NEW/SYNCED state — untouched.
    pub fn begin(&self) -> MarkTransaction<'_> {
        MarkTransaction {
            store: self,
            pending_local: self.dir.join(format!("{}-local-map.pending", self.remote)),
            pending_foreign: self.dir.join(format!("{}-foreign-map.pending", self.remote)),
        }
    }
}

/// In-flight staged update of a [`MarkStore`] pair.
///
/// Dropping without committing removes any pending files the tools wrote.
pub struct MarkTransaction<'a> {
    store: &'a MarkStore,
    pending_local: PathBuf,
    pending_foreign: PathBuf,
}

impl MarkTransaction<'_> {
    /// Path the Git-side tool exports its marks to.
    pub fn pending_local(&self) -> &Path {
        &self.pending_local
    }

    /// Path the Bazaar-side tool exports its marks to.
    pub fn pending_foreign(&self) -> &Path {
        &self.pending_foreign
    }

    /// Rename both pending files over the canonical pair.
    ///
    /// Called only after both pipeline processes reported success.
    pub fn commit(self) -> Result<(), MarkError> {
        fs::rename(&self.pending_local, &self.store.local_map)?;
        fs::rename(&self.pending_foreign, &self.store.foreign_map)?;
        info!(remote = %self.store.remote, "mark pair updated");
        Ok(())
    }
}

impl Drop for MarkTransaction<'_> {
    fn drop(&mut self) {
        // Stale pending files from an aborted pipeline; gone after a
        // successful commit, so these removals are best-effort.
        let _ = fs::remove_file(&self.pending_local);
        let _ = fs::remove_file(&self.pending_foreign);
    }
}

//! Fetch protocol: export-from-Bazaar → import-into-Git.
//!
//! The mark pair decides the mode. NEW runs a full-history import creating
//! the mirror branch; SYNCED runs an incremental update where both sides
//! reuse their marks, so only revisions not already represented move over
//! the pipe. CORRUPT aborts before any remote I/O.

use git2::Oid;
use tracing::{info, instrument};

use crate::errors::SyncError;
use crate::git::{CommitSummary, GitRepo};
use crate::marks::{MarkState, MarkStore};
use crate::process::run_pipeline;
use crate::registry::{mirror_branch, Remote};
use crate::vcs::{ExportOpts, ImportOpts, StreamExport, StreamImport};

/// Result of a fetch: which mode ran and what it produced.
#[derive(Debug)]
pub enum FetchOutcome {
    /// First fetch for this remote — the full history was transferred.
    InitialImport { tip: Oid },
    /// Incremental update of an already-synced remote. `commits` lists what
    /// is new on the mirror branch, oldest first.
    Updated {
        old_tip: Oid,
        new_tip: Oid,
        commits: Vec<CommitSummary>,
    },
}

/// Drives the export-from-Bazaar → import-into-Git pipeline.
pub struct Fetch<'a> {
    pub repo: &'a GitRepo,
    pub marks: &'a MarkStore,
    pub exporter: &'a dyn StreamExport,
    pub importer: &'a dyn StreamImport,
}

impl Fetch<'_> {
    #[instrument(skip(self, remote), fields(remote = %remote.name))]
    pub async fn run(&self, remote: &Remote) -> Result<FetchOutcome, SyncError> {
        match self.marks.state() {
            MarkState::Corrupt => Err(self.marks.inconsistent().into()),
            MarkState::New => self.initial_import(remote).await,
            MarkState::Synced => self.update(remote).await,
        }
    }

    /// Full-history transfer. The only point at which the entire remote
    /// history crosses the pipe.
    async fn initial_import(&self, remote: &Remote) -> Result<FetchOutcome, SyncError> {
        info!("no existing refmap, doing an initial import");
        self.marks.ensure_dir()?;
        let branch = mirror_branch(&remote.name);

        let txn = self.marks.begin();
        let export = self.exporter.export_command(&ExportOpts {
            source: &remote.location,
            branch: Some(&branch),
            import_marks: None,
            export_marks: txn.pending_foreign(),
        });
        let import = self.importer.import_command(&ImportOpts {
            import_marks: None,
            export_marks: txn.pending_local(),
            quiet: false,
        });
        run_pipeline(export, import).await?;
        txn.commit()?;

        let tip = self.repo.resolve(&branch)?;
        info!(tip = %tip, "initial import completed");
        Ok(FetchOutcome::InitialImport { tip })
    }

    /// Incremental transfer: both sides import the previous marks and
    /// export the refreshed set.
    async fn update(&self, remote: &Remote) -> Result<FetchOutcome, SyncError> {
        let branch = mirror_branch(&remote.name);
        let old_tip = self.repo.resolve(&branch)?;
        info!(old_tip = %old_tip, "updating remote");

        let txn = self.marks.begin();
        let export = self.exporter.export_command(&ExportOpts {
            source: &remote.location,
            branch: Some(&branch),
            import_marks: Some(self.marks.foreign_map()),
            export_marks: txn.pending_foreign(),
        });
        let import = self.importer.import_command(&ImportOpts {
            import_marks: Some(self.marks.local_map()),
            export_marks: txn.pending_local(),
            quiet: true,
        });
        run_pipeline(export, import).await?;
        txn.commit()?;

        let new_tip = self.repo.resolve(&branch)?;
        let commits = self.repo.commits_between(old_tip, new_tip)?;
        info!(new_tip = %new_tip, count = commits.len(), "update completed");
        Ok(FetchOutcome::Updated {
            old_tip,
            new_tip,
            commits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    struct NeverRuns;

    impl StreamExport for NeverRuns {
        fn export_command(&self, _opts: &ExportOpts<'_>) -> Command {
            // A corrupt mark pair must abort before any command is built.
            unreachable!("exporter invoked despite corrupt mark state")
        }
    }

    impl StreamImport for NeverRuns {
        fn import_command(&self, _opts: &ImportOpts<'_>) -> Command {
            unreachable!("importer invoked despite corrupt mark state")
        }
    }

    #[tokio::test]
    async fn test_corrupt_marks_abort_without_remote_io() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let repo = GitRepo::open(dir.path()).unwrap();

        let marks = MarkStore::new(repo.git_dir(), "trunk");
        marks.ensure_dir().unwrap();
        std::fs::write(marks.local_map(), "").unwrap();

        let fetch = Fetch {
            repo: &repo,
            marks: &marks,
            exporter: &NeverRuns,
            importer: &NeverRuns,
        };
        let remote = Remote {
            name: "trunk".into(),
            location: "/srv/bzr/trunk".into(),
        };

        let err = fetch.run(&remote).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Marks(crate::errors::MarkError::Inconsistent { .. })
        ));
    }
}

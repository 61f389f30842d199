//! Push protocol: export-from-Git → import-into-Bazaar.
//!
//! Preconditions run strictly in order with no side effects: HEAD must be a
//! strict descendant of the mirror branch, must have something new, and the
//! mark pair must exist from a prior fetch. Only then does the reverse
//! pipeline run. No local branch pointer moves; the remote's history
//! advances inside its own import tool.

use tracing::{info, instrument};

use crate::errors::SyncError;
use crate::git::GitRepo;
use crate::marks::{MarkState, MarkStore};
use crate::process::run_pipeline;
use crate::registry::{mirror_branch, Remote};
use crate::vcs::{ExportOpts, ImportOpts, StreamExport, StreamImport};

/// Result of a successful push.
#[derive(Debug)]
pub struct PushOutcome {
    /// Commits HEAD had beyond the mirror branch when the push started.
    pub commits_pushed: usize,
    /// Captured stdout of the remote-side import tool.
    pub tool_stdout: String,
}

/// Drives the export-from-Git → import-into-Bazaar pipeline.
pub struct Push<'a> {
    pub repo: &'a GitRepo,
    pub marks: &'a MarkStore,
    pub exporter: &'a dyn StreamExport,
    pub importer: &'a dyn StreamImport,
}

impl Push<'_> {
    #[instrument(skip(self, remote), fields(remote = %remote.name))]
    pub async fn run(&self, remote: &Remote) -> Result<PushOutcome, SyncError> {
        let branch = mirror_branch(&remote.name);
        let head = self.repo.resolve("HEAD")?;
        let mirror = self.repo.resolve(&branch)?;

        let (ahead, behind) = self.repo.ahead_behind(head, mirror)?;
        if behind > 0 {
            return Err(SyncError::NotFastForward(remote.name.clone()));
        }
        if ahead == 0 {
            return Err(SyncError::NothingToPush);
        }
        match self.marks.state() {
            MarkState::Synced => {}
            MarkState::New => return Err(SyncError::MissingRefmap(remote.name.clone())),
            MarkState::Corrupt => return Err(self.marks.inconsistent().into()),
        }

        info!(ahead, "pushing to bazaar branch");
        let txn = self.marks.begin();
        let export = self.exporter.export_command(&ExportOpts {
            source: "HEAD",
            branch: None,
            import_marks: Some(self.marks.local_map()),
            export_marks: txn.pending_local(),
        });
        let import = self.importer.import_command(&ImportOpts {
            import_marks: Some(self.marks.foreign_map()),
            export_marks: txn.pending_foreign(),
            quiet: false,
        });
        let output = run_pipeline(export, import).await?;
        txn.commit()?;

        info!(ahead, "push completed");
        Ok(PushOutcome {
            commits_pushed: ahead,
            tool_stdout: output.stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Oid;
    use tokio::process::Command;

    struct NeverRuns;

    impl StreamExport for NeverRuns {
        fn export_command(&self, _opts: &ExportOpts<'_>) -> Command {
            unreachable!("exporter invoked before preconditions passed")
        }
    }

    impl StreamImport for NeverRuns {
        fn import_command(&self, _opts: &ImportOpts<'_>) -> Command {
            unreachable!("importer invoked before preconditions passed")
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        raw: git2::Repository,
        repo: GitRepo,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        let repo = GitRepo::open(dir.path()).unwrap();
        Fixture {
            _dir: dir,
            raw,
            repo,
        }
    }

    fn commit_on(
        raw: &git2::Repository,
        refname: &str,
        parent: Option<Oid>,
        file: &str,
        message: &str,
    ) -> Oid {
        let sig = git2::Signature::new(
            "Test Author",
            "test@example.com",
            &git2::Time::new(1700000000, 0),
        )
        .unwrap();
        let blob = raw.blob(message.as_bytes()).unwrap();
        let parent_commit = parent.map(|oid| raw.find_commit(oid).unwrap());
        let base_tree = parent_commit.as_ref().map(|c| c.tree().unwrap());
        let mut builder = raw.treebuilder(base_tree.as_ref()).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = raw.find_tree(builder.write().unwrap()).unwrap();
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        raw.commit(Some(refname), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn push<'a>(fx: &'a Fixture, marks: &'a MarkStore) -> Push<'a> {
        Push {
            repo: &fx.repo,
            marks,
            exporter: &NeverRuns,
            importer: &NeverRuns,
        }
    }

    fn remote() -> Remote {
        Remote {
            name: "trunk".into(),
            location: "/srv/bzr/trunk".into(),
        }
    }

    #[tokio::test]
    async fn test_nothing_to_push_when_head_equals_mirror() {
        let fx = fixture();
        let c1 = commit_on(&fx.raw, "refs/heads/master", None, "a.txt", "first");
        fx.raw
            .reference("refs/heads/bzr/trunk", c1, true, "test")
            .unwrap();
        fx.raw.set_head("refs/heads/master").unwrap();

        let marks = MarkStore::new(fx.repo.git_dir(), "trunk");
        let err = push(&fx, &marks).run(&remote()).await.unwrap_err();
        assert!(matches!(err, SyncError::NothingToPush));
    }

    #[tokio::test]
    async fn test_not_fast_forward_when_mirror_is_ahead() {
        let fx = fixture();
        let c1 = commit_on(&fx.raw, "refs/heads/master", None, "a.txt", "first");
        let c2 = commit_on(&fx.raw, "refs/heads/bzr/trunk", Some(c1), "b.txt", "remote only");
        assert_ne!(c1, c2);
        fx.raw.set_head("refs/heads/master").unwrap();

        let marks = MarkStore::new(fx.repo.git_dir(), "trunk");
        let err = push(&fx, &marks).run(&remote()).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFastForward(name) if name == "trunk"));
    }

    #[tokio::test]
    async fn test_not_fast_forward_on_divergence() {
        let fx = fixture();
        let c1 = commit_on(&fx.raw, "refs/heads/master", None, "a.txt", "first");
        commit_on(&fx.raw, "refs/heads/bzr/trunk", Some(c1), "b.txt", "remote side");
        commit_on(&fx.raw, "refs/heads/master", Some(c1), "c.txt", "local side");
        fx.raw.set_head("refs/heads/master").unwrap();

        let marks = MarkStore::new(fx.repo.git_dir(), "trunk");
        let err = push(&fx, &marks).run(&remote()).await.unwrap_err();
        // Divergence still means the mirror has commits HEAD lacks.
        assert!(matches!(err, SyncError::NotFastForward(_)));
    }

    #[tokio::test]
    async fn test_missing_refmap_without_prior_fetch() {
        let fx = fixture();
        let c1 = commit_on(&fx.raw, "refs/heads/master", None, "a.txt", "first");
        fx.raw
            .reference("refs/heads/bzr/trunk", c1, true, "test")
            .unwrap();
        commit_on(&fx.raw, "refs/heads/master", Some(c1), "b.txt", "second");
        fx.raw.set_head("refs/heads/master").unwrap();

        let marks = MarkStore::new(fx.repo.git_dir(), "trunk");
        let err = push(&fx, &marks).run(&remote()).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingRefmap(name) if name == "trunk"));
    }

    #[tokio::test]
    async fn test_corrupt_marks_are_fatal_for_push() {
        let fx = fixture();
        let c1 = commit_on(&fx.raw, "refs/heads/master", None, "a.txt", "first");
        fx.raw
            .reference("refs/heads/bzr/trunk", c1, true, "test")
            .unwrap();
        commit_on(&fx.raw, "refs/heads/master", Some(c1), "b.txt", "second");
        fx.raw.set_head("refs/heads/master").unwrap();

        let marks = MarkStore::new(fx.repo.git_dir(), "trunk");
        marks.ensure_dir().unwrap();
        std::fs::write(marks.foreign_map(), "").unwrap();

        let err = push(&fx, &marks).run(&remote()).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Marks(crate::errors::MarkError::Inconsistent { .. })
        ));
    }
}

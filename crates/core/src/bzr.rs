//! Bazaar side of the bridge, driven via the `bzr` CLI.
//!
//! The engine never looks inside a Bazaar branch beyond checking for its
//! control directory; history moves exclusively through `bzr fast-export`
//! and `bzr fast-import`.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::vcs::{ExportOpts, ImportOpts, StreamExport, StreamImport};

/// A Bazaar branch at a local filesystem location.
#[derive(Debug, Clone)]
pub struct Bzr {
    location: PathBuf,
}

impl Bzr {
    pub fn new<P: Into<PathBuf>>(location: P) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// `true` if `location` carries Bazaar control metadata.
    pub fn is_branch(location: &Path) -> bool {
        location.join(".bzr").is_dir()
    }
}

impl StreamExport for Bzr {
    fn export_command(&self, opts: &ExportOpts<'_>) -> Command {
        let mut cmd = Command::new("bzr");
        cmd.arg("fast-export");
        if let Some(marks) = opts.import_marks {
            cmd.arg(format!("--import-marks={}", marks.display()));
        }
        cmd.arg(format!("--export-marks={}", opts.export_marks.display()));
        if let Some(branch) = opts.branch {
            cmd.arg(format!("--git-branch={branch}"));
        }
        cmd.arg(opts.source);
        cmd
    }
}

impl StreamImport for Bzr {
    fn import_command(&self, opts: &ImportOpts<'_>) -> Command {
        let mut cmd = Command::new("bzr");
        // fast-import resolves "-" against its working directory.
        cmd.current_dir(&self.location).arg("fast-import");
        if let Some(marks) = opts.import_marks {
            cmd.arg(format!("--import-marks={}", marks.display()));
        }
        cmd.arg(format!("--export-marks={}", opts.export_marks.display()));
        cmd.arg("-");
        cmd
    }
}

//! Capability interfaces over the fast-export / fast-import tool pair.
//!
//! The fetch and push protocols only see these traits; concrete command-line
//! construction lives with each side of the bridge ([`GitRepo`] for the local
//! Git repository, [`Bzr`] for the Bazaar branch). Tests substitute their own
//! implementations.
//!
//! [`GitRepo`]: crate::git::GitRepo
//! [`Bzr`]: crate::bzr::Bzr

use std::path::Path;

use tokio::process::Command;

/// Options for one exporter invocation.
#[derive(Debug)]
pub struct ExportOpts<'a> {
    /// What to export: a revspec for the Git side, a branch location for the
    /// Bazaar side.
    pub source: &'a str,
    /// Branch name the stream should target in the importing repository.
    pub branch: Option<&'a str>,
    /// Marks from the previous cycle; `None` means full history.
    pub import_marks: Option<&'a Path>,
    /// Where the tool writes the refreshed marks.
    pub export_marks: &'a Path,
}

/// Options for one importer invocation.
#[derive(Debug)]
pub struct ImportOpts<'a> {
    /// Marks from the previous cycle; `None` means full history.
    pub import_marks: Option<&'a Path>,
    /// Where the tool writes the refreshed marks.
    pub export_marks: &'a Path,
    pub quiet: bool,
}

/// One side's history exporter: produces an interchange stream on stdout.
pub trait StreamExport {
    fn export_command(&self, opts: &ExportOpts<'_>) -> Command;
}

/// One side's history importer: consumes an interchange stream on stdin.
pub trait StreamImport {
    fn import_command(&self, opts: &ImportOpts<'_>) -> Command;
}

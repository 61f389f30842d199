//! GitBzrSync core library.
//!
//! Foundational components for bidirectional Git/Bazaar synchronization:
//! external process execution, repository discovery and graph queries, the
//! remote registry, the mark store, and the fetch/push protocols.

pub mod bzr;
pub mod errors;
pub mod fetch;
pub mod git;
pub mod marks;
pub mod process;
pub mod push;
pub mod registry;
pub mod vcs;

// Re-exports for convenience.
pub use bzr::Bzr;
pub use errors::CoreError;
pub use fetch::{Fetch, FetchOutcome};
pub use git::GitRepo;
pub use marks::{MarkState, MarkStore};
pub use push::{Push, PushOutcome};
pub use registry::{Remote, RemoteRegistry};

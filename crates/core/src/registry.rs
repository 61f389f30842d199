//! Remote registry: symbolic name → Bazaar branch location.
//!
//! Mappings are persisted in the host repository's Git configuration under
//! `git-bzr.<name>.location`. A remote is created once by explicit
//! registration and never mutated afterwards; re-registering a name is an
//! error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bzr::Bzr;
use crate::errors::RegistryError;
use crate::git::GitRepo;

/// Configuration namespace for registered Bazaar remotes.
pub const CONFIG_NAMESPACE: &str = "git-bzr";

/// A registered Bazaar remote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub location: String,
}

/// Name of the local mirror branch tracking `name`.
pub fn mirror_branch(name: &str) -> String {
    format!("bzr/{name}")
}

/// Registers and resolves Bazaar remotes for one repository.
pub struct RemoteRegistry<'a> {
    repo: &'a GitRepo,
}

impl<'a> RemoteRegistry<'a> {
    pub fn new(repo: &'a GitRepo) -> Self {
        Self { repo }
    }

    fn location_key(name: &str) -> String {
        format!("{CONFIG_NAMESPACE}.{name}.location")
    }

    /// Register `name` at `location`.
    ///
    /// Fails with [`RegistryError::DuplicateRemote`] if the name is already
    /// a Git remote or already has a recorded location, and with
    /// [`RegistryError::InvalidRemoteLocation`] if the location is not a
    /// Bazaar branch root.
    pub fn register(&self, name: &str, location: &str) -> Result<Remote, RegistryError> {
        if self.repo.remote_names()?.iter().any(|n| n == name)
            || self.repo.config_get(&Self::location_key(name))?.is_some()
        {
            return Err(RegistryError::DuplicateRemote(name.to_string()));
        }
        if !Bzr::is_branch(Path::new(location)) {
            return Err(RegistryError::InvalidRemoteLocation(location.to_string()));
        }

        self.repo.config_set(&Self::location_key(name), location)?;
        info!(name, location, "registered bazaar remote");
        Ok(Remote {
            name: name.to_string(),
            location: location.to_string(),
        })
    }

    /// Look up the location recorded for `name`.
    ///
    /// The stored value is returned verbatim apart from whitespace trimming.
    pub fn resolve(&self, name: &str) -> Result<Remote, RegistryError> {
        let location = self
            .repo
            .config_get(&Self::location_key(name))?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RegistryError::UnknownRemote(name.to_string()))?;
        Ok(Remote {
            name: name.to_string(),
            location,
        })
    }
}

//! Repository roles and the unit of de-duplication

use super::ArtifactCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical repository role an artifact was resolved through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepositoryType {
    /// Regular project dependency graph
    Main,
    /// Build plugin graph
    Plugin,
}

impl Default for RepositoryType {
    fn default() -> Self {
        RepositoryType::Main
    }
}

impl RepositoryType {
    /// Returns the display name
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryType::Main => "MAIN",
            RepositoryType::Plugin => "PLUGIN",
        }
    }
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An artifact together with the repository role it must be fetched through
///
/// Equality and hashing cover exactly these two fields: the same coordinate
/// under two roles is two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactWithRepoType {
    pub artifact: ArtifactCoordinate,
    pub repository_type: RepositoryType,
}

impl ArtifactWithRepoType {
    pub fn new(artifact: ArtifactCoordinate, repository_type: RepositoryType) -> Self {
        Self {
            artifact,
            repository_type,
        }
    }

    pub fn main(artifact: ArtifactCoordinate) -> Self {
        Self::new(artifact, RepositoryType::Main)
    }

    pub fn plugin(artifact: ArtifactCoordinate) -> Self {
        Self::new(artifact, RepositoryType::Plugin)
    }
}

impl fmt::Display for ArtifactWithRepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.artifact, self.repository_type)
    }
}

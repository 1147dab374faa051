//! Artifact type filter selecting which resolution passes run

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of artifacts a resolution pass produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactType {
    /// Project dependencies (and their ancestor POMs)
    Dependency,
    /// Build plugins and their dependencies
    Plugin,
    /// Dependencies declared in the go-offline configuration
    DynamicDependency,
}

impl ArtifactType {
    /// Returns all artifact types
    pub fn all() -> &'static [ArtifactType] {
        &[
            ArtifactType::Dependency,
            ArtifactType::Plugin,
            ArtifactType::DynamicDependency,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Dependency => "Dependency",
            ArtifactType::Plugin => "Plugin",
            ArtifactType::DynamicDependency => "DynamicDependency",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "dependency" | "dependencies" => Ok(ArtifactType::Dependency),
            "plugin" | "plugins" => Ok(ArtifactType::Plugin),
            "dynamicdependency" | "dynamicdependencies" | "dynamic" => {
                Ok(ArtifactType::DynamicDependency)
            }
            _ => Err(ConfigError::InvalidArtifactType {
                value: s.to_string(),
            }),
        }
    }
}

/// Set of enabled artifact types; empty means everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactTypeFilter {
    types: Vec<ArtifactType>,
}

impl ArtifactTypeFilter {
    /// Create a filter that enables every artifact type
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter restricted to the given types
    pub fn with_types(types: impl IntoIterator<Item = ArtifactType>) -> Self {
        let mut filtered = Vec::new();
        for t in types {
            if !filtered.contains(&t) {
                filtered.push(t);
            }
        }
        Self { types: filtered }
    }

    /// Check if a type should be resolved
    pub fn includes(&self, artifact_type: ArtifactType) -> bool {
        if self.types.is_empty() {
            return true; // No filter means resolve everything
        }
        self.types.contains(&artifact_type)
    }

    /// Enabled types in resolution order
    pub fn enabled(&self) -> Vec<ArtifactType> {
        [
            ArtifactType::Plugin,
            ArtifactType::Dependency,
            ArtifactType::DynamicDependency,
        ]
        .into_iter()
        .filter(|t| self.includes(*t))
        .collect()
    }
}

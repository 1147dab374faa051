//! Reactor build units with their declared dependencies and plugins

use super::ArtifactCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Dependency scope as declared in a POM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl DependencyScope {
    /// Parse a scope string, falling back to `compile` for anything unknown
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("provided") => DependencyScope::Provided,
            Some("runtime") => DependencyScope::Runtime,
            Some("test") => DependencyScope::Test,
            Some("system") => DependencyScope::System,
            Some("import") => DependencyScope::Import,
            _ => DependencyScope::Compile,
        }
    }

    /// Whether a dependency in this scope is fetched from a repository at all
    pub fn is_resolvable(&self) -> bool {
        !matches!(self, DependencyScope::System | DependencyScope::Import)
    }

    /// Whether a transitive dependency in this scope reaches the consumer
    pub fn is_transitive(&self) -> bool {
        matches!(self, DependencyScope::Compile | DependencyScope::Runtime)
    }
}

/// `groupId:artifactId` pattern excluded from a dependency's subtree (`*` matches all)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, artifact: &ArtifactCoordinate) -> bool {
        (self.group_id == "*" || self.group_id == artifact.group_id)
            && (self.artifact_id == "*" || self.artifact_id == artifact.artifact_id)
    }
}

/// A dependency declaration with its resolved (interpolated) coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub artifact: ArtifactCoordinate,
    pub scope: DependencyScope,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<Exclusion>,
}

impl DependencyDeclaration {
    pub fn new(artifact: ArtifactCoordinate) -> Self {
        Self {
            artifact,
            scope: DependencyScope::Compile,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.artifact, self.scope)
    }
}

/// A build plugin declared by a unit, with the dependencies added to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDeclaration {
    /// Plugin artifact; `version` may be empty when nothing pins it
    pub artifact: ArtifactCoordinate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDeclaration>,
}

impl PluginDeclaration {
    pub fn new(artifact: ArtifactCoordinate) -> Self {
        Self {
            artifact,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: DependencyDeclaration) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn has_version(&self) -> bool {
        !self.artifact.version.trim().is_empty()
    }
}

impl fmt::Display for PluginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.artifact.group_id, self.artifact.artifact_id, self.artifact.version
        )
    }
}

/// One module of the reactor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
    /// The module's own POM coordinate
    pub coordinate: ArtifactCoordinate,
    /// Directory holding the module's pom.xml, if it came from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    pub dependencies: Vec<DependencyDeclaration>,
    /// Effective dependencyManagement, applied to transitive versions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_management: Vec<DependencyDeclaration>,
    pub plugins: Vec<PluginDeclaration>,
}

impl BuildUnit {
    pub fn new(coordinate: ArtifactCoordinate) -> Self {
        Self {
            coordinate,
            base_dir: None,
            dependencies: Vec::new(),
            dependency_management: Vec::new(),
            plugins: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: DependencyDeclaration) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_plugin(mut self, plugin: PluginDeclaration) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// `group:artifact:version` label used in logs and error records
    pub fn label(&self) -> String {
        format!(
            "{}:{}:{}",
            self.coordinate.group_id, self.coordinate.artifact_id, self.coordinate.version
        )
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

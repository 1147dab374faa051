//! User-declared dependencies that no POM in the reactor mentions

use super::{ArtifactCoordinate, RepositoryType};
use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// Allowed characters for group, artifact and version segments
static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap());

/// A dependency supplied through the go-offline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicDependency {
    #[serde(default, alias = "groupId")]
    pub group_id: Option<String>,
    #[serde(default, alias = "artifactId")]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default, rename = "type")]
    pub dependency_type: Option<String>,
    #[serde(default, alias = "repositoryType")]
    pub repository_type: RepositoryType,
    #[serde(default, alias = "includeTransitive")]
    pub include_transitive: bool,
}

impl DynamicDependency {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: Some(group_id.into()),
            artifact_id: Some(artifact_id.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_type(mut self, dependency_type: impl Into<String>) -> Self {
        self.dependency_type = Some(dependency_type.into());
        self
    }

    pub fn with_repository_type(mut self, repository_type: RepositoryType) -> Self {
        self.repository_type = repository_type;
        self
    }

    pub fn with_transitive(mut self, include_transitive: bool) -> Self {
        self.include_transitive = include_transitive;
        self
    }

    /// Check that group, artifact and version are present and well formed
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coordinate().map(|_| ())
    }

    /// Build the artifact coordinate, validating the descriptor on the way
    pub fn coordinate(&self) -> Result<ArtifactCoordinate, ConfigError> {
        let group_id = required_segment("groupId", self.group_id.as_deref(), self)?;
        let artifact_id = required_segment("artifactId", self.artifact_id.as_deref(), self)?;
        let version = required_segment("version", self.version.as_deref(), self)?;

        let classifier = self.classifier.as_deref().map(str::trim).filter(|c| !c.is_empty());
        if let Some(classifier) = classifier {
            if !SEGMENT_RE.is_match(classifier) {
                return Err(ConfigError::invalid_field(
                    self.to_string(),
                    "classifier",
                    classifier,
                ));
            }
        }

        let dependency_type = self
            .dependency_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(dependency_type) = dependency_type {
            if !SEGMENT_RE.is_match(dependency_type) {
                return Err(ConfigError::invalid_field(
                    self.to_string(),
                    "type",
                    dependency_type,
                ));
            }
        }

        Ok(ArtifactCoordinate::from_type(
            group_id,
            artifact_id,
            version,
            dependency_type,
            classifier,
        ))
    }
}

fn required_segment<'a>(
    field: &'static str,
    value: Option<&'a str>,
    dependency: &DynamicDependency,
) -> Result<&'a str, ConfigError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ConfigError::missing_field(dependency.to_string(), field));
    }
    if !SEGMENT_RE.is_match(value) {
        return Err(ConfigError::invalid_field(
            dependency.to_string(),
            field,
            value,
        ));
    }
    Ok(value)
}

impl fmt::Display for DynamicDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{}:{}:{}",
            field(&self.group_id),
            field(&self.artifact_id),
            field(&self.version)
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

impl FromStr for DynamicDependency {
    type Err = ConfigError;

    /// Parses the command-line form `group:artifact:version[:type[:classifier]]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 3 || parts.len() > 5 {
            return Err(ConfigError::invalid_coordinate(
                s,
                "expected 'group:artifact:version[:type[:classifier]]'",
            ));
        }
        let non_empty = |p: &str| Some(p.to_string()).filter(|p| !p.is_empty());
        let dependency = DynamicDependency {
            group_id: non_empty(parts[0]),
            artifact_id: non_empty(parts[1]),
            version: non_empty(parts[2]),
            dependency_type: parts.get(3).and_then(|p| non_empty(p)),
            classifier: parts.get(4).and_then(|p| non_empty(p)),
            ..DynamicDependency::default()
        };
        Ok(dependency)
    }
}

//! Artifact coordinates and the standard repository layout

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default extension for artifacts that do not declare one
pub const DEFAULT_EXTENSION: &str = "jar";

/// Fully qualified artifact coordinate (group, artifact, version, classifier, extension)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub extension: String,
}

impl ArtifactCoordinate {
    /// Creates a coordinate for the main `jar` of an artifact
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Creates a coordinate from a dependency `type` as written in a POM
    ///
    /// Packaging types such as `maven-plugin` or `test-jar` are mapped onto
    /// their on-disk extension (and classifier, for `test-jar`).
    pub fn from_type(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        dependency_type: Option<&str>,
        classifier: Option<&str>,
    ) -> Self {
        let (extension, implied_classifier) = extension_for_type(dependency_type.unwrap_or("jar"));
        let classifier = classifier
            .filter(|c| !c.is_empty())
            .or(implied_classifier)
            .map(str::to_string);
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier,
            extension: extension.to_string(),
        }
    }

    /// Sets the classifier (builder pattern)
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Sets the extension (builder pattern)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the version (builder pattern)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Returns the classifier, if any
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// The descriptor (POM) coordinate of this artifact
    pub fn pom(&self) -> Self {
        Self {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            classifier: None,
            extension: "pom".to_string(),
        }
    }

    /// A classifier variant of this artifact (`sources`, `javadoc`, ...) packaged as a jar
    pub fn variant(&self, classifier: &str) -> Self {
        Self {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            classifier: Some(classifier.to_string()),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Whether this coordinate points at a descriptor
    pub fn is_pom(&self) -> bool {
        self.extension == "pom"
    }

    /// Key used for version mediation: everything except the version
    pub fn versionless_key(&self) -> String {
        match self.classifier() {
            Some(classifier) => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, classifier
            ),
            None => format!("{}:{}:{}", self.group_id, self.artifact_id, self.extension),
        }
    }

    /// `group:artifact` without version information
    pub fn management_key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Version directory relative to a repository root: `org/example/lib/1.0`
    pub fn version_dir(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version
        )
    }

    /// File name inside the version directory: `lib-1.0-sources.jar`
    pub fn file_name(&self) -> String {
        match self.classifier() {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Path relative to a repository root, always `/`-separated
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.version_dir(), self.file_name())
    }

    /// Location of this artifact under a local repository root
    pub fn local_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.version_dir().split('/') {
            path.push(segment);
        }
        path.push(self.file_name());
        path
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.classifier() {
            Some(classifier) => write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, classifier, self.version
            ),
            None => write!(
                f,
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, self.version
            ),
        }
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = ConfigError;

    /// Parses `g:a:v`, `g:a:ext:v` or `g:a:ext:classifier:v`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::invalid_coordinate(s, "empty segment"));
        }
        match parts.as_slice() {
            [g, a, v] => Ok(Self::new(*g, *a, *v)),
            [g, a, ext, v] => Ok(Self::new(*g, *a, *v).with_extension(*ext)),
            [g, a, ext, classifier, v] => Ok(Self::new(*g, *a, *v)
                .with_extension(*ext)
                .with_classifier(*classifier)),
            _ => Err(ConfigError::invalid_coordinate(
                s,
                "expected 'group:artifact[:extension[:classifier]]:version'",
            )),
        }
    }
}

/// Maps a dependency `type` onto (extension, implied classifier)
pub fn extension_for_type(dependency_type: &str) -> (&str, Option<&'static str>) {
    match dependency_type {
        "maven-plugin" | "ejb" | "bundle" | "jar" => ("jar", None),
        "test-jar" => ("jar", Some("tests")),
        "ejb-client" => ("jar", Some("client")),
        "java-source" => ("jar", Some("sources")),
        "javadoc" => ("jar", Some("javadoc")),
        other => (other, None),
    }
}

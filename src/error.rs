//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: invalid configuration, aborts before any resolution starts
//! - RepositoryError: remote or file repository communication
//! - DescriptorError: POM reading and interpretation
//! - ResolutionError: artifact and dependency graph resolution
//! - FetchError: materializing an artifact into the target repository
//! - IoError: File system operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Repository communication errors
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// POM related errors
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Resolution errors
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Download errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required field of a dynamic dependency is absent or empty
    #[error("dynamic dependency '{dependency}' is missing required field '{field}'")]
    MissingField {
        dependency: String,
        field: &'static str,
    },

    /// Field of a dynamic dependency is malformed
    #[error("dynamic dependency '{dependency}' has invalid {field} '{value}'")]
    InvalidField {
        dependency: String,
        field: &'static str,
        value: String,
    },

    /// Unknown artifact type in the filter
    #[error(
        "invalid artifact type '{value}': expected 'Dependency', 'Plugin' or 'DynamicDependency'"
    )]
    InvalidArtifactType { value: String },

    /// Unparseable coordinate string
    #[error("invalid coordinate '{value}': {reason}")]
    InvalidCoordinate { value: String, reason: String },

    /// Invalid repository URL
    #[error("invalid repository URL '{url}': expected an http(s):// or file:// URL")]
    InvalidRepository { url: String },

    /// Failed to read configuration file
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file
    #[error("failed to parse configuration file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to repository communication
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Resource not present in the repository
    #[error("'{resource}' not found in repository {repository}")]
    NotFound { resource: String, repository: String },

    /// Network request failed
    #[error("failed to fetch '{resource}' from {repository}: {message}")]
    NetworkError {
        resource: String,
        repository: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for repository {repository}")]
    RateLimitExceeded { repository: String },

    /// Timeout
    #[error("timeout while fetching '{resource}' from {repository}")]
    Timeout { resource: String, repository: String },

    /// Reading from a file repository failed
    #[error("failed to read '{resource}' from {repository}: {source}")]
    ReadError {
        resource: String,
        repository: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to POM documents
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Malformed XML
    #[error("failed to parse POM {location}: {message}")]
    Parse { location: String, message: String },

    /// Required element is missing
    #[error("POM {location} is missing <{element}>")]
    MissingElement {
        location: String,
        element: &'static str,
    },

    /// Parent chain loops back on itself
    #[error("cyclic parent chain detected at {location}")]
    ParentCycle { location: String },
}

/// Errors raised while resolving artifacts and dependency graphs
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Artifact exists in none of the configured repositories
    #[error("artifact {artifact} could not be found in {repositories} repositories")]
    ArtifactNotFound {
        artifact: String,
        repositories: usize,
    },

    /// No usable version for an artifact
    #[error("unable to determine version for {artifact}: {reason}")]
    UnresolvedVersion { artifact: String, reason: String },

    /// Failure while resolving one node of a dependency graph
    #[error("failed to collect dependencies of {artifact}: {source}")]
    Collection {
        artifact: String,
        #[source]
        source: Box<ResolutionError>,
    },
}

/// Errors raised while downloading artifacts into the target repository
#[derive(Error, Debug)]
pub enum FetchError {
    /// Artifact exists in none of the repositories for its role
    #[error("artifact {artifact} not found in any {repository_type} repository")]
    NotFound {
        artifact: String,
        repository_type: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Writing the artifact failed
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Permission denied
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Creates a new MissingField error
    pub fn missing_field(dependency: impl Into<String>, field: &'static str) -> Self {
        ConfigError::MissingField {
            dependency: dependency.into(),
            field,
        }
    }

    /// Creates a new InvalidField error
    pub fn invalid_field(
        dependency: impl Into<String>,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidField {
            dependency: dependency.into(),
            field,
            value: value.into(),
        }
    }

    /// Creates a new InvalidCoordinate error
    pub fn invalid_coordinate(value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidCoordinate {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl RepositoryError {
    /// Creates a new NotFound error
    pub fn not_found(resource: impl Into<String>, repository: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            resource: resource.into(),
            repository: repository.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        resource: impl Into<String>,
        repository: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RepositoryError::NetworkError {
            resource: resource.into(),
            repository: repository.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(resource: impl Into<String>, repository: impl Into<String>) -> Self {
        RepositoryError::Timeout {
            resource: resource.into(),
            repository: repository.into(),
        }
    }

    /// Whether the repository answered that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl DescriptorError {
    /// Creates a new Parse error
    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        DescriptorError::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates a new MissingElement error
    pub fn missing_element(location: impl Into<String>, element: &'static str) -> Self {
        DescriptorError::MissingElement {
            location: location.into(),
            element,
        }
    }
}

impl ResolutionError {
    /// Creates a new UnresolvedVersion error
    pub fn unresolved_version(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolutionError::UnresolvedVersion {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an error raised while expanding a graph node
    pub fn collection(artifact: impl Into<String>, source: ResolutionError) -> Self {
        ResolutionError::Collection {
            artifact: artifact.into(),
            source: Box::new(source),
        }
    }
}

impl FetchError {
    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Whether the artifact simply does not exist upstream
    pub fn is_not_found(&self) -> bool {
        match self {
            FetchError::NotFound { .. } => true,
            FetchError::Repository(e) => e.is_not_found(),
            FetchError::WriteError { .. } => false,
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new PermissionDenied error
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        IoError::PermissionDenied { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }

    /// Maps a std IO error onto the closest variant
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => IoError::directory_not_found(path),
            std::io::ErrorKind::PermissionDenied => IoError::permission_denied(path),
            _ => IoError::generic(path, source),
        }
    }
}

//! Closure resolution passes and the collaborator traits they drive
//!
//! This module provides:
//! - `ArtifactResolver` / `DescriptorBuilder`: the external resolution service
//! - Plugin, project dependency, ancestor chain and dynamic dependency passes
//!
//! Every pass catches collaborator failures and turns them into error
//! records; nothing propagates past a single unit of work.

mod ancestor;
mod context;
mod dynamic;
mod plugin;
mod project;

pub use ancestor::AncestorChainResolver;
pub use context::{
    PassGuard, PluginProcessingGuard, Repository, ResolutionContext, MAVEN_CENTRAL_URL,
};
pub use dynamic::DynamicDependencyResolver;
pub use plugin::PluginResolver;
pub use project::ProjectDependencyResolver;

use crate::domain::{
    ArtifactCoordinate, DependencyDeclaration, ProjectDescriptor, RepositoryType,
};
use crate::error::{FetchError, ResolutionError};
use async_trait::async_trait;
use std::path::Path;

/// Request for the transitive closure of a root artifact and/or a dependency list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectRequest {
    /// Artifact whose own POM dependencies are collected; not part of the result
    pub root: Option<ArtifactCoordinate>,
    /// Direct dependencies (all scopes except system/import are followed)
    pub dependencies: Vec<DependencyDeclaration>,
    /// Managed versions overriding transitive versions
    pub managed: Vec<DependencyDeclaration>,
}

impl CollectRequest {
    /// Collect the dependencies declared by a root artifact
    pub fn for_root(root: ArtifactCoordinate) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// Collect the closure of an explicit dependency list
    pub fn for_dependencies(dependencies: Vec<DependencyDeclaration>) -> Self {
        Self {
            dependencies,
            ..Self::default()
        }
    }

    /// Add extra direct dependencies (builder pattern)
    pub fn with_dependencies(mut self, dependencies: Vec<DependencyDeclaration>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    /// Set the dependency management (builder pattern)
    pub fn with_managed(mut self, managed: Vec<DependencyDeclaration>) -> Self {
        self.managed = managed;
        self
    }
}

/// Result of materializing one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was transferred
    Downloaded { bytes: u64 },
    /// The file was already in the target repository
    AlreadyPresent,
}

/// Artifact resolution service
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Confirm an artifact exists for the given role and return its resolved coordinate
    async fn resolve_artifact(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
    ) -> Result<ArtifactCoordinate, ResolutionError>;

    /// Transitive dependency closure of a request, excluding the root and reactor modules
    async fn resolve_dependencies(
        &self,
        context: &ResolutionContext,
        request: &CollectRequest,
        repository_type: RepositoryType,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError>;

    /// Fetch an artifact into the repository layout rooted at `destination`,
    /// using the repositories of its role
    async fn fetch(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
        destination: &Path,
    ) -> Result<FetchOutcome, FetchError>;
}

/// Builds descriptor models for arbitrary artifacts
#[async_trait]
pub trait DescriptorBuilder: Send + Sync {
    /// Descriptor of `artifact` with its full parent chain
    ///
    /// Build plugins are only listed while `context.process_plugins()` holds.
    async fn build_descriptor(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
    ) -> Result<ProjectDescriptor, ResolutionError>;
}

//! Core domain models for go-offline
//!
//! This module contains the fundamental types used throughout the application:
//! - Artifact coordinates and the repository layout
//! - Repository roles and the de-duplication key of the closure
//! - Artifact type filtering
//! - Build units, dependency and plugin declarations
//! - Dynamic dependencies supplied through configuration
//! - Project descriptors and their ancestor chains

mod artifact_type;
mod build_unit;
mod coordinate;
mod descriptor;
mod dynamic_dependency;
mod repository_type;

pub use artifact_type::{ArtifactType, ArtifactTypeFilter};
pub use build_unit::{
    BuildUnit, DependencyDeclaration, DependencyScope, Exclusion, PluginDeclaration,
};
pub use coordinate::{extension_for_type, ArtifactCoordinate, DEFAULT_EXTENSION};
pub use descriptor::{Ancestors, ProjectDescriptor};
pub use dynamic_dependency::DynamicDependency;
pub use repository_type::{ArtifactWithRepoType, RepositoryType};

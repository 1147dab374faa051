//! Parent POM chains of resolved artifacts
//!
//! An offline build reads the parent POMs of every artifact it touches, so
//! each ancestor becomes a download target. Ancestors are always tagged
//! MAIN, including those of artifacts resolved for plugins.

use super::{DescriptorBuilder, ResolutionContext};
use crate::closure::ClosureSet;
use crate::diagnostics::{ErrorLog, Stage};
use crate::domain::{ArtifactCoordinate, ArtifactWithRepoType};
use crate::error::ResolutionError;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub struct AncestorChainResolver<'a> {
    descriptors: &'a dyn DescriptorBuilder,
    context: &'a ResolutionContext,
    errors: &'a ErrorLog,
    concurrency: usize,
}

impl<'a> AncestorChainResolver<'a> {
    pub fn new(
        descriptors: &'a dyn DescriptorBuilder,
        context: &'a ResolutionContext,
        errors: &'a ErrorLog,
        concurrency: usize,
    ) -> Self {
        Self {
            descriptors,
            context,
            errors,
            concurrency: concurrency.max(1),
        }
    }

    /// POM coordinates of every ancestor of `artifact`, nearest first
    pub async fn ancestors_of(
        &self,
        artifact: &ArtifactCoordinate,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError> {
        let descriptor = self
            .descriptors
            .build_descriptor(self.context, artifact)
            .await?;
        Ok(descriptor
            .ancestors()
            .map(|ancestor| ancestor.coordinate.pom())
            .collect())
    }

    /// Ancestors of every given artifact, with plugin processing disabled throughout
    pub async fn resolve_all(&self, artifacts: &[ArtifactWithRepoType]) -> ClosureSet {
        let _guard = self.context.disable_plugin_processing().await;

        // classifier variants and POMs share one chain
        let descriptors: BTreeSet<ArtifactCoordinate> =
            artifacts.iter().map(|item| item.artifact.pom()).collect();

        let results: Vec<_> = stream::iter(&descriptors)
            .map(|artifact| async move { (artifact, self.ancestors_of(artifact).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let closure = ClosureSet::new();
        for (artifact, result) in results {
            match result {
                Ok(ancestors) => {
                    if !ancestors.is_empty() {
                        debug!(artifact = %artifact, ancestors = ancestors.len(), "Resolved ancestor chain");
                    }
                    closure.extend(ancestors.into_iter().map(ArtifactWithRepoType::main));
                }
                Err(e) => {
                    warn!(artifact = %artifact, error = %e, "Failed to resolve ancestor chain");
                    self.errors
                        .warning(Stage::Ancestor, artifact.to_string(), e.to_string());
                }
            }
        }
        closure
    }
}

//! Expansion of configured dynamic dependencies

use super::{ArtifactResolver, CollectRequest, ResolutionContext};
use crate::closure::ClosureSet;
use crate::diagnostics::{ErrorLog, Stage};
use crate::domain::{ArtifactCoordinate, ArtifactWithRepoType, DynamicDependency};
use crate::error::ResolutionError;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

pub struct DynamicDependencyResolver<'a> {
    resolver: &'a dyn ArtifactResolver,
    context: &'a ResolutionContext,
    errors: &'a ErrorLog,
    concurrency: usize,
}

impl<'a> DynamicDependencyResolver<'a> {
    pub fn new(
        resolver: &'a dyn ArtifactResolver,
        context: &'a ResolutionContext,
        errors: &'a ErrorLog,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            context,
            errors,
            concurrency: concurrency.max(1),
        }
    }

    /// Expand one dynamic dependency
    ///
    /// Failures are recorded. If only the transitive step fails, the
    /// dependency itself is still returned.
    pub async fn expand(&self, dependency: &DynamicDependency) -> Vec<ArtifactWithRepoType> {
        self.expand_into(dependency, self.errors).await
    }

    async fn expand_into(
        &self,
        dependency: &DynamicDependency,
        errors: &ErrorLog,
    ) -> Vec<ArtifactWithRepoType> {
        let repository_type = dependency.repository_type;

        let resolved = match self.resolve_primary(dependency).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(dependency = %dependency, error = %e, "Failed to resolve dynamic dependency");
                errors.error(Stage::DynamicDependency, dependency.to_string(), &e);
                return Vec::new();
            }
        };

        let mut items = vec![ArtifactWithRepoType::new(resolved.clone(), repository_type)];
        if dependency.include_transitive {
            let request = CollectRequest::for_root(resolved);
            match self
                .resolver
                .resolve_dependencies(self.context, &request, repository_type)
                .await
            {
                Ok(dependencies) => {
                    debug!(
                        dependency = %dependency,
                        dependencies = dependencies.len(),
                        "Resolved dynamic dependency transitives"
                    );
                    items.extend(
                        dependencies
                            .into_iter()
                            .map(|artifact| ArtifactWithRepoType::new(artifact, repository_type)),
                    );
                }
                Err(e) => {
                    warn!(dependency = %dependency, error = %e, "Failed to resolve transitive dependencies");
                    errors.error(Stage::DynamicDependency, dependency.to_string(), &e);
                }
            }
        }
        items
    }

    async fn resolve_primary(
        &self,
        dependency: &DynamicDependency,
    ) -> Result<ArtifactCoordinate, ResolutionError> {
        let coordinate = dependency
            .coordinate()
            .map_err(|e| ResolutionError::unresolved_version(dependency.to_string(), e.to_string()))?;
        self.resolver
            .resolve_artifact(self.context, &coordinate, dependency.repository_type)
            .await
    }

    /// Expand every dynamic dependency concurrently
    ///
    /// Errors are recorded in declaration order.
    pub async fn expand_all(&self, dependencies: &[DynamicDependency]) -> ClosureSet {
        let _pass = self.context.enter_pass().await;

        let results: Vec<_> = stream::iter(dependencies)
            .map(|dependency| async move {
                let errors = ErrorLog::new();
                let items = self.expand_into(dependency, &errors).await;
                (items, errors.into_records())
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let closure = ClosureSet::new();
        for (items, records) in results {
            closure.extend(items);
            for record in records {
                self.errors.push(record);
            }
        }
        closure
    }
}

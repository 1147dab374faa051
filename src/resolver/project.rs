//! Reactor unit dependency resolution

use super::{ArtifactResolver, CollectRequest, ResolutionContext};
use crate::closure::ClosureSet;
use crate::diagnostics::{ErrorLog, Stage};
use crate::domain::{ArtifactCoordinate, ArtifactWithRepoType, BuildUnit, RepositoryType};
use crate::error::ResolutionError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct ProjectDependencyResolver<'a> {
    resolver: &'a dyn ArtifactResolver,
    context: &'a ResolutionContext,
    errors: &'a ErrorLog,
    copy_poms: bool,
    concurrency: usize,
}

impl<'a> ProjectDependencyResolver<'a> {
    pub fn new(
        resolver: &'a dyn ArtifactResolver,
        context: &'a ResolutionContext,
        errors: &'a ErrorLog,
        copy_poms: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            context,
            errors,
            copy_poms,
            concurrency: concurrency.max(1),
        }
    }

    /// Full transitive graph of one unit, tagged MAIN
    pub async fn resolve(
        &self,
        unit: &BuildUnit,
    ) -> Result<Vec<ArtifactWithRepoType>, ResolutionError> {
        let request = CollectRequest::for_dependencies(unit.dependencies.clone())
            .with_managed(unit.dependency_management.clone());
        let artifacts = self
            .resolver
            .resolve_dependencies(self.context, &request, RepositoryType::Main)
            .await?;

        debug!(unit = %unit, artifacts = artifacts.len(), "Resolved unit dependencies");

        let mut items = Vec::with_capacity(artifacts.len() * 2);
        for artifact in artifacts {
            if self.copy_poms && !artifact.is_pom() {
                items.push(ArtifactWithRepoType::main(artifact.pom()));
            }
            items.push(ArtifactWithRepoType::main(artifact));
        }
        Ok(items)
    }

    /// Resolve every unit concurrently; reactor modules themselves are never targets
    pub async fn resolve_all(&self, units: &[BuildUnit]) -> ClosureSet {
        let _pass = self.context.enter_pass().await;

        let reactor: HashSet<String> = units.iter().map(|unit| gav(&unit.coordinate)).collect();

        let results: Vec<_> = stream::iter(units)
            .map(|unit| async move { (unit, self.resolve(unit).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let closure = ClosureSet::new();
        for (unit, result) in results {
            match result {
                Ok(items) => {
                    closure.extend(
                        items
                            .into_iter()
                            .filter(|item| !reactor.contains(&gav(&item.artifact))),
                    );
                }
                Err(e) => {
                    warn!(unit = %unit, error = %e, "Failed to resolve unit dependencies");
                    self.errors.error(Stage::Dependency, unit.label(), &e);
                }
            }
        }
        closure
    }
}

fn gav(coordinate: &ArtifactCoordinate) -> String {
    format!(
        "{}:{}:{}",
        coordinate.group_id, coordinate.artifact_id, coordinate.version
    )
}

//! Build plugin resolution
//!
//! A plugin and everything it depends on is fetched through the plugin
//! repositories, so every artifact produced here is tagged PLUGIN.

use super::{ArtifactResolver, CollectRequest, ResolutionContext};
use crate::closure::ClosureSet;
use crate::diagnostics::{ErrorLog, Stage};
use crate::domain::{ArtifactWithRepoType, PluginDeclaration, RepositoryType};
use crate::error::ResolutionError;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

pub struct PluginResolver<'a> {
    resolver: &'a dyn ArtifactResolver,
    context: &'a ResolutionContext,
    errors: &'a ErrorLog,
    concurrency: usize,
}

impl<'a> PluginResolver<'a> {
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

    /// Resolve one plugin artifact and its transitive dependencies
    pub async fn resolve(
        &self,
        plugin: &PluginDeclaration,
    ) -> Result<Vec<ArtifactWithRepoType>, ResolutionError> {
        if !plugin.has_version() {
            return Err(ResolutionError::unresolved_version(
                format!("{}:{}", plugin.artifact.group_id, plugin.artifact.artifact_id),
                "no version declared or managed for plugin",
            ));
        }

        let resolved = self
            .resolver
            .resolve_artifact(self.context, &plugin.artifact, RepositoryType::Plugin)
            .await?;

        let request = CollectRequest::for_root(resolved.clone())
            .with_dependencies(plugin.dependencies.clone());
        let dependencies = self
            .resolver
            .resolve_dependencies(self.context, &request, RepositoryType::Plugin)
            .await?;

        debug!(
            plugin = %plugin,
            dependencies = dependencies.len(),
            "Resolved plugin"
        );

        Ok(std::iter::once(resolved)
            .chain(dependencies)
            .map(ArtifactWithRepoType::plugin)
            .collect())
    }

    /// Resolve every plugin concurrently; failures are recorded per plugin
    pub async fn resolve_all(&self, plugins: &[PluginDeclaration]) -> ClosureSet {
        let _pass = self.context.enter_pass().await;

        let results: Vec<_> = stream::iter(plugins)
            .map(|plugin| async move { (plugin, self.resolve(plugin).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let closure = ClosureSet::new();
        for (plugin, result) in results {
            match result {
                Ok(items) => {
                    closure.extend(items);
                }
                Err(e) => {
                    warn!(plugin = %plugin, error = %e, "Failed to resolve plugin");
                    self.errors.error(Stage::Plugin, plugin.to_string(), &e);
                }
            }
        }
        closure
    }
}

//! Integration tests for go-offline
//!
//! These tests verify:
//! - Closure semantics of a whole run against an in-memory repository
//! - Error isolation, filtering and exit status policy
//! - The Maven resolver and reactor loader against a `file://` repository

use async_trait::async_trait;
use go_offline::config::GoOfflineConfig;
use go_offline::diagnostics::Stage;
use go_offline::domain::{
    ArtifactCoordinate, ArtifactWithRepoType, BuildUnit, DependencyDeclaration,
    DynamicDependency, PluginDeclaration, ProjectDescriptor, RepositoryType,
};
use go_offline::error::{ConfigError, FetchError, ResolutionError};
use go_offline::orchestrator::{Orchestrator, ResolutionReport};
use go_offline::resolver::{
    ArtifactResolver, CollectRequest, DescriptorBuilder, FetchOutcome, ResolutionContext,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn coord(s: &str) -> ArtifactCoordinate {
    s.parse().unwrap()
}

/// In-memory repository standing in for the Maven resolver
#[derive(Default)]
struct MemoryRepository {
    /// `group:artifact:version` to direct dependencies
    graph: HashMap<String, Vec<ArtifactCoordinate>>,
    /// `group:artifact:version` to parent POM
    parents: HashMap<String, ArtifactCoordinate>,
    /// `group:artifact:version` of artifacts that do not exist
    missing: HashSet<String>,
    /// Classifier variants that exist
    variants: HashSet<String>,
    calls: AtomicUsize,
    fetched: Mutex<Vec<ArtifactCoordinate>>,
}

fn gav(artifact: &ArtifactCoordinate) -> String {
    format!(
        "{}:{}:{}",
        artifact.group_id, artifact.artifact_id, artifact.version
    )
}

impl MemoryRepository {
    fn with_deps(mut self, artifact: &str, deps: &[&str]) -> Self {
        self.graph
            .insert(gav(&coord(artifact)), deps.iter().map(|d| coord(d)).collect());
        self
    }

    fn with_parent(mut self, artifact: &str, parent: &str) -> Self {
        self.parents
            .insert(gav(&coord(artifact)), coord(parent).pom());
        self
    }

    fn with_missing(mut self, artifact: &str) -> Self {
        self.missing.insert(gav(&coord(artifact)));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fetched(&self) -> HashSet<String> {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.to_string())
            .collect()
    }

    fn check(&self, artifact: &ArtifactCoordinate) -> Result<(), ResolutionError> {
        if self.missing.contains(&gav(artifact)) {
            return Err(ResolutionError::ArtifactNotFound {
                artifact: artifact.to_string(),
                repositories: 1,
            });
        }
        Ok(())
    }

    fn closure_of(
        &self,
        roots: Vec<ArtifactCoordinate>,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut queue: Vec<ArtifactCoordinate> = roots;
        while let Some(artifact) = queue.pop() {
            self.check(&artifact)?;
            if !seen.insert(gav(&artifact)) {
                continue;
            }
            if let Some(deps) = self.graph.get(&gav(&artifact)) {
                queue.extend(deps.iter().cloned());
            }
            result.push(artifact);
        }
        Ok(result)
    }
}

#[async_trait]
impl ArtifactResolver for MemoryRepository {
    async fn resolve_artifact(
        &self,
        _context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        _repository_type: RepositoryType,
    ) -> Result<ArtifactCoordinate, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check(artifact)?;
        Ok(artifact.clone())
    }

    async fn resolve_dependencies(
        &self,
        _context: &ResolutionContext,
        request: &CollectRequest,
        _repository_type: RepositoryType,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut roots: Vec<ArtifactCoordinate> = request
            .dependencies
            .iter()
            .map(|d| d.artifact.clone())
            .collect();
        if let Some(root) = &request.root {
            self.check(root)?;
            roots.extend(self.graph.get(&gav(root)).cloned().unwrap_or_default());
        }
        self.closure_of(roots)
    }

    async fn fetch(
        &self,
        _context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
        _destination: &Path,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(classifier) = artifact.classifier() {
            if !self
                .variants
                .contains(&format!("{}:{}", gav(artifact), classifier))
            {
                return Err(FetchError::NotFound {
                    artifact: artifact.to_string(),
                    repository_type: repository_type.to_string(),
                });
            }
        }
        self.fetched.lock().unwrap().push(artifact.clone());
        Ok(FetchOutcome::Downloaded { bytes: 1 })
    }
}

#[async_trait]
impl DescriptorBuilder for MemoryRepository {
    async fn build_descriptor(
        &self,
        _context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
    ) -> Result<ProjectDescriptor, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut chain = vec![artifact.pom()];
        while let Some(parent) = chain.last().and_then(|a| self.parents.get(&gav(a))) {
            chain.push(parent.clone());
        }
        let mut descriptor: Option<ProjectDescriptor> = None;
        for coordinate in chain.into_iter().rev() {
            let node = ProjectDescriptor::new(coordinate);
            descriptor = Some(match descriptor {
                Some(parent) => node.with_parent(parent),
                None => node,
            });
        }
        descriptor.ok_or_else(|| ResolutionError::unresolved_version(artifact.to_string(), "empty"))
    }
}

fn unit(coordinate: &str, deps: &[&str]) -> BuildUnit {
    let mut unit = BuildUnit::new(coord(coordinate));
    for dep in deps {
        unit = unit.with_dependency(DependencyDeclaration::new(coord(dep)));
    }
    unit
}

fn config(target: &TempDir) -> GoOfflineConfig {
    GoOfflineConfig {
        target_repository: Some(target.path().to_path_buf()),
        local_repository: Some(target.path().to_path_buf()),
        ..GoOfflineConfig::default()
    }
}

async fn run(
    repository: Arc<MemoryRepository>,
    config: GoOfflineConfig,
    units: Vec<BuildUnit>,
) -> Result<ResolutionReport, ConfigError> {
    Orchestrator::new(
        config,
        repository.clone(),
        repository,
        ResolutionContext::default(),
        units,
    )
    .run()
    .await
}

fn members(report: &ResolutionReport) -> HashSet<String> {
    report.closure.iter().map(|m| m.to_string()).collect()
}

mod closure_properties {
    use super::*;

    #[tokio::test]
    async fn test_resolving_twice_gives_same_closure() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(
            MemoryRepository::default()
                .with_deps("org.example:lib:1.0", &["org.example:io:2.0"])
                .with_parent("org.example:lib:1.0", "org.example:parent:3"),
        );
        let units = vec![unit("org.example:app:1.0", &["org.example:lib:1.0"])];

        let once = run(repository.clone(), config(&target), units.clone())
            .await
            .unwrap();
        let twice = run(
            repository,
            config(&target),
            vec![units[0].clone(), units[0].clone()],
        )
        .await
        .unwrap();

        assert_eq!(members(&once), members(&twice));
        assert_eq!(once.closure.len(), 3);
    }

    #[tokio::test]
    async fn test_same_coordinate_under_both_roles_is_two_entries() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(MemoryRepository::default());
        let shared = "org.codehaus.plexus:plexus-utils:3.5.1";
        let app = unit("org.example:app:1.0", &[shared, shared]).with_plugin(
            PluginDeclaration::new(coord("org.example:build-plugin:1.0"))
                .with_dependency(DependencyDeclaration::new(coord(shared))),
        );

        let report = run(repository, config(&target), vec![app]).await.unwrap();
        let shared = coord(shared);
        let entries: Vec<_> = report
            .closure
            .iter()
            .filter(|m| m.artifact == shared)
            .collect();

        assert_eq!(entries.len(), 2);
        assert!(report
            .closure
            .contains(&ArtifactWithRepoType::main(shared.clone())));
        assert!(report.closure.contains(&ArtifactWithRepoType::plugin(shared)));
    }

    #[tokio::test]
    async fn test_ancestors_are_main() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(
            MemoryRepository::default()
                .with_parent("org.example:d:1", "org.example:p:1")
                .with_parent("org.example:p:1", "org.example:q:1"),
        );

        let report = run(
            repository,
            config(&target),
            vec![unit("org.example:app:1", &["org.example:d:1"])],
        )
        .await
        .unwrap();

        for expected in ["org.example:d:1", "org.example:p:pom:1", "org.example:q:pom:1"] {
            assert!(
                report
                    .closure
                    .contains(&ArtifactWithRepoType::main(coord(expected))),
                "missing {}",
                expected
            );
        }
        assert_eq!(report.count(RepositoryType::Plugin), 0);
    }

    #[tokio::test]
    async fn test_plugin_filter_skips_other_passes() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(MemoryRepository::default());
        let mut config = config(&target);
        config.artifact_types = vec!["Plugin".to_string()];
        config.dynamic_dependencies = vec![DynamicDependency::new("org.example", "agent", "1.0")];
        let app = unit("org.example:app:1.0", &["org.example:lib:1.0"])
            .with_plugin(PluginDeclaration::new(coord("org.example:build-plugin:1.0")));

        let report = run(repository, config, vec![app]).await.unwrap();

        assert_eq!(
            members(&report),
            HashSet::from(["org.example:build-plugin:jar:1.0 (PLUGIN)".to_string()])
        );
    }
}

mod failure_handling {
    use super::*;

    #[tokio::test]
    async fn test_failing_unit_is_isolated() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(MemoryRepository::default().with_missing("org.example:broken:1.0"));
        let units = vec![
            unit("org.example:b1:1.0", &["org.example:one:1.0"]),
            unit("org.example:b2:1.0", &["org.example:broken:1.0"]),
            unit("org.example:b3:1.0", &["org.example:three:1.0"]),
        ];

        let report = run(repository, config(&target), units).await.unwrap();

        assert!(report
            .closure
            .contains(&ArtifactWithRepoType::main(coord("org.example:one:1.0"))));
        assert!(report
            .closure
            .contains(&ArtifactWithRepoType::main(coord("org.example:three:1.0"))));
        let b2: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.context.contains("org.example:b2:1.0"))
            .collect();
        assert_eq!(b2.len(), 1);
        assert_eq!(b2[0].stage, Stage::Dependency);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_dynamic_dependency_aborts_before_any_call() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(MemoryRepository::default());
        let mut config = config(&target);
        config.dynamic_dependencies = vec![DynamicDependency {
            group_id: Some("org.example".to_string()),
            artifact_id: Some("agent".to_string()),
            ..DynamicDependency::default()
        }];

        let result = run(
            repository.clone(),
            config,
            vec![unit("org.example:app:1.0", &["org.example:lib:1.0"])],
        )
        .await;

        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
        assert_eq!(repository.calls(), 0);
    }

    #[tokio::test]
    async fn test_fail_on_errors_only_changes_status() {
        let target = TempDir::new().unwrap();
        let build = || {
            Arc::new(
                MemoryRepository::default()
                    .with_missing("org.example:ghost-plugin:1.0"),
            )
        };
        let app = unit("org.example:app:1.0", &["org.example:lib:1.0"])
            .with_plugin(PluginDeclaration::new(coord("org.example:ghost-plugin:1.0")));

        let lenient_repo = build();
        let lenient = run(lenient_repo.clone(), config(&target), vec![app.clone()])
            .await
            .unwrap();

        let strict_repo = build();
        let mut strict_config = config(&target);
        strict_config.fail_on_errors = true;
        let strict = run(strict_repo.clone(), strict_config, vec![app])
            .await
            .unwrap();

        assert_eq!(lenient.errors.len(), 1);
        assert!(!lenient.is_failure(false));
        assert!(strict.is_failure(true));
        assert_eq!(lenient_repo.fetched(), strict_repo.fetched());
    }

    #[tokio::test]
    async fn test_missing_sources_is_not_an_error() {
        let target = TempDir::new().unwrap();
        let repository = Arc::new(MemoryRepository::default());
        let mut config = config(&target);
        config.download_sources = true;

        let report = run(
            repository.clone(),
            config,
            vec![unit("org.example:app:1.0", &["org.example:lib:1.0"])],
        )
        .await
        .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.download.missing_variants, 1);
        assert_eq!(report.download.failed, 0);
        assert!(repository
            .fetched()
            .contains("org.example:lib:jar:1.0"));
    }
}

mod maven_repository {
    use super::*;
    use go_offline::maven::{load_reactor, HttpClient, MavenResolver, RepositoryTransport};
    use go_offline::resolver::Repository;
    use std::fs;

    fn publish(root: &Path, coordinate: &str, body: &str) {
        let coordinate = coord(coordinate);
        let pom = coordinate.pom().local_path(root);
        fs::create_dir_all(pom.parent().unwrap()).unwrap();
        fs::write(
            &pom,
            format!(
                "<project><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version>{}</project>",
                coordinate.group_id, coordinate.artifact_id, coordinate.version, body
            ),
        )
        .unwrap();
        fs::write(coordinate.local_path(root), b"binary").unwrap();
    }

    #[tokio::test]
    async fn test_offline_repository_from_file_mirror() {
        let remote = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        publish(remote.path(), "org.example:base:5", "<packaging>pom</packaging>");
        publish(
            remote.path(),
            "org.example:lib:1.0",
            "<parent><groupId>org.example</groupId><artifactId>base</artifactId><version>5</version></parent>\
             <dependencies><dependency><groupId>org.example</groupId><artifactId>io</artifactId><version>2.0</version></dependency></dependencies>",
        );
        publish(remote.path(), "org.example:io:2.0", "");
        publish(remote.path(), "org.example:tool:1.0", "");

        fs::write(
            project.path().join("pom.xml"),
            r#"<project>
  <groupId>org.example</groupId>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <dependencies>
    <dependency><groupId>org.example</groupId><artifactId>lib</artifactId><version>1.0</version></dependency>
  </dependencies>
</project>"#,
        )
        .unwrap();

        let mirror = Repository::new("mirror", format!("file://{}", remote.path().display()));
        let context = ResolutionContext::new(vec![mirror.clone()], vec![mirror]);
        let resolver = Arc::new(MavenResolver::new(
            RepositoryTransport::new(HttpClient::new().unwrap()),
            local.path(),
        ));
        let reactor = load_reactor(project.path(), &resolver, &context)
            .await
            .unwrap();

        let config = GoOfflineConfig {
            artifact_types: vec!["Dependency".to_string(), "DynamicDependency".to_string()],
            local_repository: Some(local.path().to_path_buf()),
            dynamic_dependencies: vec![DynamicDependency::new("org.example", "tool", "1.0")],
            ..GoOfflineConfig::default()
        };
        let report = Orchestrator::new(config, resolver.clone(), resolver, context, reactor.units)
            .run()
            .await
            .unwrap();

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        for artifact in [
            "org.example:lib:1.0",
            "org.example:io:2.0",
            "org.example:tool:1.0",
            "org.example:base:pom:5",
        ] {
            let path = coord(artifact).local_path(local.path());
            assert!(path.is_file(), "{} not downloaded", artifact);
        }
        assert!(!coord("org.example:app:1.0").local_path(local.path()).exists());
    }
}
